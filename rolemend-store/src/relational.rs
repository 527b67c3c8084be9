//! Relational projection of role records — the `role_sync` table.
//!
//! Three statement shapes cover everything the reconciliation needs:
//! insert, delete by natural key, and update-active by correlation id.
//! Each mutation runs in its own short transaction; a failed statement
//! rolls back only that transaction.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use rolemend_core::types::{RoleName, RoleScope, SyncStatus, TeamId, UserId};

use crate::error::StoreError;

/// One row of the `role_sync` table. `doc_id` is the correlation key: the
/// document-store identifier of the mirrored role record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRow {
    pub doc_id: String,
    pub user_id: UserId,
    pub role_name: RoleName,
    pub scope: RoleScope,
    pub team_id: TeamId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub sync_status: SyncStatus,
    pub last_sync_at: DateTime<Utc>,
}

/// The mutation interface the synchronizer needs from the projection.
pub trait RelationalStore {
    /// Insert a freshly synced role row.
    fn insert_role(&mut self, row: &RoleRow) -> Result<(), StoreError>;

    /// Delete the row matching the natural key `(user, team, role, scope)`.
    fn delete_role(
        &mut self,
        user_id: &UserId,
        team_id: &TeamId,
        role_name: RoleName,
        scope: RoleScope,
    ) -> Result<(), StoreError>;

    /// Flip the active flag on the row with the given correlation id and
    /// stamp the sync time.
    fn set_role_active(
        &mut self,
        doc_id: &str,
        is_active: bool,
        last_sync_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// SqliteRoleStore
// ---------------------------------------------------------------------------

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS role_sync (
    doc_id       TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    role_name    TEXT NOT NULL,
    scope        TEXT NOT NULL,
    team_id      TEXT NOT NULL,
    is_active    INTEGER NOT NULL,
    created_at   TEXT NOT NULL,
    created_by   TEXT NOT NULL,
    sync_status  TEXT NOT NULL,
    last_sync_at TEXT NOT NULL
)";

/// SQLite-backed [`RelationalStore`]. Bootstraps the `role_sync` schema on
/// open.
#[derive(Debug)]
pub struct SqliteRoleStore {
    conn: Connection,
}

impl SqliteRoleStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }

    /// An in-memory database, for tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }

    /// Every row, ordered by insertion. Read-only; used by tests and
    /// operator spot checks, never by the reconciliation itself.
    pub fn all_rows(&self) -> Result<Vec<RoleRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, user_id, role_name, scope, team_id, is_active,
                    created_at, created_by, sync_status, last_sync_at
             FROM role_sync ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, String>(9)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (
                doc_id,
                user_id,
                role_name,
                scope,
                team_id,
                is_active,
                created_at,
                created_by,
                sync_status,
                last_sync_at,
            ) = row?;
            out.push(RoleRow {
                doc_id,
                user_id: UserId(user_id),
                role_name: decode_text(&role_name)?,
                scope: decode_text(&scope)?,
                team_id: TeamId(team_id),
                is_active,
                created_at: decode_text(&created_at)?,
                created_by,
                sync_status: decode_text(&sync_status)?,
                last_sync_at: decode_text(&last_sync_at)?,
            });
        }
        Ok(out)
    }
}

/// Decode a TEXT column through the same serde wire forms the documents
/// use (`"owner"`, `"TEAM"`, RFC 3339 timestamps).
fn decode_text<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, StoreError> {
    Ok(serde_json::from_value(serde_json::Value::String(
        text.to_owned(),
    ))?)
}

impl RelationalStore for SqliteRoleStore {
    fn insert_role(&mut self, row: &RoleRow) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO role_sync (
                 doc_id, user_id, role_name, scope, team_id,
                 is_active, created_at, created_by, sync_status, last_sync_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                row.doc_id,
                row.user_id.0,
                row.role_name.as_str(),
                row.scope.as_str(),
                row.team_id.0,
                row.is_active,
                row.created_at.to_rfc3339(),
                row.created_by,
                row.sync_status.as_str(),
                row.last_sync_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_role(
        &mut self,
        user_id: &UserId,
        team_id: &TeamId,
        role_name: RoleName,
        scope: RoleScope,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM role_sync
             WHERE user_id = ?1 AND team_id = ?2 AND role_name = ?3 AND scope = ?4",
            params![user_id.0, team_id.0, role_name.as_str(), scope.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn set_role_active(
        &mut self,
        doc_id: &str,
        is_active: bool,
        last_sync_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE role_sync SET is_active = ?2, last_sync_at = ?3 WHERE doc_id = ?1",
            params![doc_id, is_active, last_sync_at.to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
