//! Aggregate counters for one reconciliation run.

use serde::Serialize;

use crate::auditor::ReconcileAction;
use crate::synchronizer::ApplyResult;

/// The externally observed summary of a run. In dry-run mode the counters
/// are the hypothetical counts live mode would have produced on the same
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub dry_run: bool,
    pub created: u64,
    pub deleted: u64,
    pub deactivated: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl Report {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Fold one apply outcome into the counters.
    pub fn record(&mut self, action: &ReconcileAction, result: &ApplyResult) {
        match result {
            ApplyResult::AlreadySatisfied | ApplyResult::WouldSkip => self.skipped += 1,
            ApplyResult::Applied | ApplyResult::WouldApply => match action {
                ReconcileAction::Create(_) => self.created += 1,
                ReconcileAction::Delete(_) => self.deleted += 1,
                ReconcileAction::Deactivate(_) => self.deactivated += 1,
            },
        }
    }
}
