//! Synchronizer — applies one reconciliation action to both stores.
//!
//! ## Apply protocol
//!
//! 1. Re-query the document store with the auditor's filter.
//! 2. Postcondition already holds → `AlreadySatisfied` (the idempotency
//!    guard for reruns after a crash or a concurrent fix).
//! 3. Dry-run → classify as `WouldApply` without touching either store.
//! 4. Mutate the document store (authoritative) first.
//! 5. Mirror into the relational store in its own short transaction.
//!
//! A relational failure after step 4 surfaces as
//! [`EngineError::PartialSync`]: the document-store mutation stands and the
//! relational side stays behind until a later run. That asymmetry is
//! intentional — the document store wins on conflict.

use chrono::Utc;
use serde_json::json;

use rolemend_core::types::{RoleRecord, RoleScope, SyncStatus};
use rolemend_store::{
    collections, document::ID_FIELD, fields, DocumentStore, RelationalStore, RoleRow,
};

use crate::auditor::{NewRole, ReconcileAction};
use crate::error::EngineError;

/// Creator recorded on role records written by the reconciliation.
const CREATED_BY: &str = "system";

/// Outcome of applying a single action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// Both stores were mutated.
    Applied,
    /// The postcondition already held; nothing was touched.
    AlreadySatisfied,
    /// Dry-run: the action would have been applied.
    WouldApply,
    /// Dry-run: the postcondition already holds.
    WouldSkip,
}

/// Applies [`ReconcileAction`]s to the two stores, or classifies them in
/// dry-run mode.
#[derive(Debug)]
pub struct Synchronizer {
    dry_run: bool,
}

impl Synchronizer {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Apply one action. Failures are returned, never panicked; the caller
    /// decides whether to continue the run.
    pub fn apply<D: DocumentStore, R: RelationalStore>(
        &self,
        docs: &mut D,
        rel: &mut R,
        action: &ReconcileAction,
    ) -> Result<ApplyResult, EngineError> {
        match action {
            ReconcileAction::Create(new_role) => self.apply_create(docs, rel, new_role),
            ReconcileAction::Delete(record) => self.apply_delete(docs, rel, record),
            ReconcileAction::Deactivate(record) => self.apply_deactivate(docs, rel, record),
        }
    }

    fn skip(&self) -> ApplyResult {
        if self.dry_run {
            ApplyResult::WouldSkip
        } else {
            ApplyResult::AlreadySatisfied
        }
    }

    fn apply_create<D: DocumentStore, R: RelationalStore>(
        &self,
        docs: &mut D,
        rel: &mut R,
        new_role: &NewRole,
    ) -> Result<ApplyResult, EngineError> {
        let filter = fields([
            ("user_id", json!(new_role.user_id.0)),
            ("team_id", json!(new_role.team_id.0)),
            ("scope", json!(RoleScope::Team.as_str())),
            ("role_name", json!(new_role.role_name.as_str())),
            ("is_active", json!(true)),
        ]);
        if !docs.find(collections::USER_ROLES, &filter)?.is_empty() {
            tracing::debug!(
                "create {}/{}/{}: already present",
                new_role.team_id,
                new_role.user_id,
                new_role.role_name
            );
            return Ok(self.skip());
        }
        if self.dry_run {
            return Ok(ApplyResult::WouldApply);
        }

        let now = Utc::now();
        let doc = fields([
            ("user_id", json!(new_role.user_id.0)),
            ("role_name", json!(new_role.role_name.as_str())),
            ("scope", json!(RoleScope::Team.as_str())),
            ("team_id", json!(new_role.team_id.0)),
            ("is_active", json!(true)),
            ("created_by", json!(CREATED_BY)),
            ("created_at", json!(now)),
        ]);
        let doc_id = docs.insert_one(collections::USER_ROLES, doc)?;

        let row = RoleRow {
            doc_id: doc_id.clone(),
            user_id: new_role.user_id.clone(),
            role_name: new_role.role_name,
            scope: RoleScope::Team,
            team_id: new_role.team_id.clone(),
            is_active: true,
            created_at: now,
            created_by: CREATED_BY.to_owned(),
            sync_status: SyncStatus::Synced,
            last_sync_at: now,
        };
        rel.insert_role(&row)
            .map_err(|source| EngineError::PartialSync { doc_id, source })?;

        tracing::info!(
            "created {} role for {} in team {}",
            new_role.role_name,
            new_role.user_id,
            new_role.team_id
        );
        Ok(ApplyResult::Applied)
    }

    fn apply_delete<D: DocumentStore, R: RelationalStore>(
        &self,
        docs: &mut D,
        rel: &mut R,
        record: &RoleRecord,
    ) -> Result<ApplyResult, EngineError> {
        let filter = fields([(ID_FIELD, json!(record.id.0))]);
        if docs.find(collections::USER_ROLES, &filter)?.is_empty() {
            tracing::debug!("delete {}: already gone", record.id);
            return Ok(self.skip());
        }
        if self.dry_run {
            return Ok(ApplyResult::WouldApply);
        }

        docs.delete_one(collections::USER_ROLES, &filter)?;
        rel.delete_role(&record.user_id, &record.team_id, record.role_name, record.scope)
            .map_err(|source| EngineError::PartialSync {
                doc_id: record.id.0.clone(),
                source,
            })?;

        tracing::info!(
            "deleted {} role for {} in team {}",
            record.role_name,
            record.user_id,
            record.team_id
        );
        Ok(ApplyResult::Applied)
    }

    fn apply_deactivate<D: DocumentStore, R: RelationalStore>(
        &self,
        docs: &mut D,
        rel: &mut R,
        record: &RoleRecord,
    ) -> Result<ApplyResult, EngineError> {
        let active_filter = fields([
            (ID_FIELD, json!(record.id.0)),
            ("is_active", json!(true)),
        ]);
        if docs.find(collections::USER_ROLES, &active_filter)?.is_empty() {
            tracing::debug!("deactivate {}: already inactive or gone", record.id);
            return Ok(self.skip());
        }
        if self.dry_run {
            return Ok(ApplyResult::WouldApply);
        }

        let now = Utc::now();
        docs.update_one(
            collections::USER_ROLES,
            &fields([(ID_FIELD, json!(record.id.0))]),
            fields([("is_active", json!(false))]),
        )?;
        rel.set_role_active(&record.id.0, false, now)
            .map_err(|source| EngineError::PartialSync {
                doc_id: record.id.0.clone(),
                source,
            })?;

        tracing::info!(
            "deactivated lingering {} role for {} in team {}",
            record.role_name,
            record.user_id,
            record.team_id
        );
        Ok(ApplyResult::Applied)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
