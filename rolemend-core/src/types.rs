//! Domain types for role reconciliation.
//!
//! These are read-only snapshots of what the document store holds; field
//! names mirror the stored documents so serde can decode them directly.
//! Role names and scopes are closed enums — an unknown string fails to
//! decode instead of silently passing through.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed team identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TeamId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TeamId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The document-store identifier of a role record. Doubles as the
/// correlation key mirrored into the relational projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleRecordId(pub String);

impl fmt::Display for RoleRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RoleRecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RoleRecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// A team-scoped role. Declaration order is the canonical emission order
/// for reconciliation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Owner,
    Admin,
    Member,
}

impl RoleName {
    /// All roles, in canonical order.
    pub const ALL: [RoleName; 3] = [RoleName::Owner, RoleName::Admin, RoleName::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Owner => "owner",
            RoleName::Admin => "admin",
            RoleName::Member => "member",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope of a role record. Only team scope exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleScope {
    #[serde(rename = "TEAM")]
    Team,
}

impl RoleScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleScope::Team => "TEAM",
        }
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync status of a relational projection row. Statuses other than
/// `SYNCED` are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    #[serde(rename = "SYNCED")]
    Synced,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "SYNCED",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A team, as stored in the `teams` collection. Read-only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: TeamId,
    pub created_by: UserId,
}

/// A `(team, user)` membership pair from the `memberships` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub team_id: TeamId,
}

/// A role record from the `user_roles` collection. Only `is_active` is
/// ever mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    #[serde(rename = "_id")]
    pub id: RoleRecordId,
    pub user_id: UserId,
    pub team_id: TeamId,
    pub role_name: RoleName,
    pub scope: RoleScope,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// The role set a membership is entitled to: the full set for the team
/// creator, exactly `member` for everyone else.
pub fn expected_roles(is_creator: bool) -> &'static [RoleName] {
    if is_creator {
        &RoleName::ALL
    } else {
        &[RoleName::Member]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(UserId::from("u1").to_string(), "u1");
        assert_eq!(TeamId::from("t1").to_string(), "t1");
        assert_eq!(RoleRecordId::from("abc123").to_string(), "abc123");
    }

    #[rstest]
    #[case(RoleName::Owner, "\"owner\"")]
    #[case(RoleName::Admin, "\"admin\"")]
    #[case(RoleName::Member, "\"member\"")]
    fn role_name_serializes_lowercase(#[case] role: RoleName, #[case] json: &str) {
        assert_eq!(serde_json::to_string(&role).unwrap(), json);
        assert_eq!(serde_json::from_str::<RoleName>(json).unwrap(), role);
    }

    #[test]
    fn unknown_role_name_fails_to_decode() {
        assert!(serde_json::from_str::<RoleName>("\"superuser\"").is_err());
    }

    #[test]
    fn scope_and_status_use_uppercase_wire_form() {
        assert_eq!(serde_json::to_string(&RoleScope::Team).unwrap(), "\"TEAM\"");
        assert_eq!(
            serde_json::to_string(&SyncStatus::Synced).unwrap(),
            "\"SYNCED\""
        );
    }

    #[test]
    fn expected_roles_for_creator_is_full_set() {
        assert_eq!(expected_roles(true), &RoleName::ALL);
        assert_eq!(expected_roles(false), &[RoleName::Member]);
    }

    #[test]
    fn role_record_decodes_from_document_fields() {
        let json = r#"{
            "_id": "r1",
            "user_id": "u1",
            "team_id": "t1",
            "role_name": "admin",
            "scope": "TEAM",
            "is_active": true,
            "created_by": "system",
            "created_at": "2026-01-02T03:04:05Z"
        }"#;
        let record: RoleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.role_name, RoleName::Admin);
        assert_eq!(record.scope, RoleScope::Team);
        assert!(record.is_active);
    }
}
