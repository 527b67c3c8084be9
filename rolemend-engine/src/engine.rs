//! Reconciliation engine — the run driver.
//!
//! Walks a strict linear phase sequence over both stores:
//!
//! ```text
//! Connecting → AuditingTeams → AuditingOwnerRoles → AuditingMemberRoles
//!            → SweepingLingeringRoles → Reporting → Closed
//! ```
//!
//! One team, one member, one action at a time; all I/O is blocking. A
//! failure while loading the team list aborts the run (nothing useful can
//! happen without it); every later failure — a team whose records cannot be
//! read, a document that does not decode, an action that fails to apply —
//! is counted and the run continues.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use rolemend_core::types::{Membership, RoleRecord, RoleScope, Team, TeamId};
use rolemend_store::{collections, fields, Document, DocumentStore, Filter, RelationalStore};

use crate::auditor;
use crate::error::EngineError;
use crate::report::Report;
use crate::synchronizer::Synchronizer;

/// Engine run phases, in order. The sequence never branches back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    AuditingTeams,
    AuditingOwnerRoles,
    AuditingMemberRoles,
    SweepingLingeringRoles,
    Reporting,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Connecting => "connecting",
            Phase::AuditingTeams => "auditing-teams",
            Phase::AuditingOwnerRoles => "auditing-owner-roles",
            Phase::AuditingMemberRoles => "auditing-member-roles",
            Phase::SweepingLingeringRoles => "sweeping-lingering-roles",
            Phase::Reporting => "reporting",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// The reconciliation driver. Owns both store handles for the duration of
/// the run; dropping the engine releases them.
#[derive(Debug)]
pub struct Engine<D, R> {
    docs: D,
    rel: R,
    synchronizer: Synchronizer,
    report: Report,
    phase: Phase,
}

impl<D: DocumentStore, R: RelationalStore> Engine<D, R> {
    /// Wrap already-acquired store handles. Acquisition failures are the
    /// caller's to report; they are fatal for the whole run.
    pub fn new(docs: D, rel: R, dry_run: bool) -> Self {
        tracing::info!("phase: {}", Phase::Connecting);
        Self {
            docs,
            rel,
            synchronizer: Synchronizer::new(dry_run),
            report: Report::new(dry_run),
            phase: Phase::Connecting,
        }
    }

    /// The phase the engine is currently in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        tracing::info!("phase: {phase}");
        self.phase = phase;
    }

    /// Run the full reconciliation and return the aggregate report.
    pub fn run(mut self) -> Result<Report, EngineError> {
        self.enter(Phase::AuditingTeams);
        let teams = match self.load_teams() {
            Ok(teams) => teams,
            Err(e) => {
                self.enter(Phase::Closed);
                return Err(e);
            }
        };
        tracing::info!("loaded {} teams", teams.len());

        self.enter(Phase::AuditingOwnerRoles);
        for team in &teams {
            self.audit_owner_roles(team);
        }

        self.enter(Phase::AuditingMemberRoles);
        for team in &teams {
            self.audit_member_roles(team);
        }

        self.enter(Phase::SweepingLingeringRoles);
        self.sweep_lingering_roles();

        self.enter(Phase::Reporting);
        let report = self.report.clone();
        tracing::info!(
            "run complete: created={} deleted={} deactivated={} skipped={} errors={}",
            report.created,
            report.deleted,
            report.deactivated,
            report.skipped,
            report.errors
        );

        self.enter(Phase::Closed);
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    fn audit_owner_roles(&mut self, team: &Team) {
        let (memberships, roles) = match self.load_team_snapshot(&team.id) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("skipping team {}: {e}", team.id);
                self.report.errors += 1;
                return;
            }
        };
        for action in auditor::audit_owner_roles(team, &memberships, &roles) {
            self.apply(&action);
        }
    }

    fn audit_member_roles(&mut self, team: &Team) {
        let (memberships, roles) = match self.load_team_snapshot(&team.id) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("skipping team {}: {e}", team.id);
                self.report.errors += 1;
                return;
            }
        };
        self.report.skipped += auditor::satisfied_member_roles(team, &memberships, &roles);
        for action in auditor::audit_member_roles(team, &memberships, &roles) {
            self.apply(&action);
        }
    }

    /// The sweep needs a global view: all memberships, all active roles,
    /// independent of any single team. A load failure here skips the sweep
    /// but keeps the per-team results already applied.
    fn sweep_lingering_roles(&mut self) {
        let loaded = self
            .docs
            .find(collections::MEMBERSHIPS, &Filter::new())
            .and_then(|memberships| {
                let roles = self
                    .docs
                    .find(collections::USER_ROLES, &active_team_roles_filter(None))?;
                Ok((memberships, roles))
            });
        let (memberships, roles) = match loaded {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("lingering-role sweep skipped: {e}");
                self.report.errors += 1;
                return;
            }
        };

        let memberships: Vec<Membership> = self.decode_documents(memberships);
        let roles: Vec<RoleRecord> = self.decode_documents(roles);
        for action in auditor::audit_lingering_roles(&roles, &memberships) {
            self.apply(&action);
        }
    }

    // -----------------------------------------------------------------------
    // Store access
    // -----------------------------------------------------------------------

    fn load_teams(&mut self) -> Result<Vec<Team>, EngineError> {
        let docs = self.docs.find(collections::TEAMS, &Filter::new())?;
        Ok(self.decode_documents(docs))
    }

    fn load_team_snapshot(
        &mut self,
        team_id: &TeamId,
    ) -> Result<(Vec<Membership>, Vec<RoleRecord>), EngineError> {
        let memberships = self.docs.find(
            collections::MEMBERSHIPS,
            &fields([("team_id", json!(team_id.0))]),
        )?;
        let roles = self.docs.find(
            collections::USER_ROLES,
            &active_team_roles_filter(Some(team_id)),
        )?;
        Ok((
            self.decode_documents(memberships),
            self.decode_documents(roles),
        ))
    }

    /// Decode documents into model types, counting (and skipping) records
    /// that do not parse. A malformed record must never abort the run.
    fn decode_documents<T: DeserializeOwned>(&mut self, docs: Vec<Document>) -> Vec<T> {
        let mut decoded = Vec::with_capacity(docs.len());
        for doc in docs {
            match serde_json::from_value(Value::Object(doc)) {
                Ok(value) => decoded.push(value),
                Err(e) => {
                    tracing::warn!("skipping malformed document: {e}");
                    self.report.errors += 1;
                }
            }
        }
        decoded
    }

    fn apply(&mut self, action: &auditor::ReconcileAction) {
        match self.synchronizer.apply(&mut self.docs, &mut self.rel, action) {
            Ok(result) => self.report.record(action, &result),
            Err(e) => {
                tracing::error!("action failed: {e}");
                self.report.errors += 1;
            }
        }
    }
}

fn active_team_roles_filter(team_id: Option<&TeamId>) -> Filter {
    let mut filter = fields([
        ("scope", json!(RoleScope::Team.as_str())),
        ("is_active", json!(true)),
    ]);
    if let Some(team_id) = team_id {
        filter.insert("team_id".to_owned(), json!(team_id.0));
    }
    filter
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
