//! Auditor — pure diff of membership facts against role records.
//!
//! Given a team's membership snapshot and its active role records, computes
//! the corrective actions. No side effects and no store access, so every
//! rule here is unit-testable in isolation.
//!
//! Action order is deterministic: memberships in snapshot order, roles in
//! canonical enum order. Re-auditing an already-correct snapshot yields an
//! empty action list.

use std::collections::HashSet;

use rolemend_core::types::{expected_roles, Membership, RoleName, RoleRecord, Team, TeamId, UserId};

/// A corrective operation computed by the auditor, applied by the
/// synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Create a missing role for an existing membership.
    Create(NewRole),
    /// Delete a role a regular member is not entitled to.
    Delete(RoleRecord),
    /// Deactivate a role whose membership no longer exists.
    Deactivate(RoleRecord),
}

/// The identity of a role to be created. Creation metadata (creator,
/// timestamp) is stamped by the synchronizer at mutation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub user_id: UserId,
    pub team_id: TeamId,
    pub role_name: RoleName,
}

/// Full audit of one team: creator entitlements first, then regular-member
/// corrections, in stable order.
pub fn audit_team(
    team: &Team,
    memberships: &[Membership],
    active_roles: &[RoleRecord],
) -> Vec<ReconcileAction> {
    let mut actions = audit_owner_roles(team, memberships, active_roles);
    actions.extend(audit_member_roles(team, memberships, active_roles));
    actions
}

/// Creator entitlements: every role in `{owner, admin, member}` must exist.
///
/// Missing roles are created; extra roles a creator already holds are never
/// stripped.
pub fn audit_owner_roles(
    team: &Team,
    memberships: &[Membership],
    active_roles: &[RoleRecord],
) -> Vec<ReconcileAction> {
    let mut actions = Vec::new();
    for membership in memberships {
        if membership.user_id != team.created_by {
            continue;
        }
        for &role_name in expected_roles(true) {
            let present = active_roles
                .iter()
                .any(|r| r.user_id == membership.user_id && r.role_name == role_name);
            if !present {
                actions.push(ReconcileAction::Create(NewRole {
                    user_id: membership.user_id.clone(),
                    team_id: team.id.clone(),
                    role_name,
                }));
            }
        }
    }
    actions
}

/// Regular-member corrections: exactly one `member` role, nothing else.
///
/// Extra roles are deleted (in canonical role order); a missing `member`
/// role is created.
pub fn audit_member_roles(
    team: &Team,
    memberships: &[Membership],
    active_roles: &[RoleRecord],
) -> Vec<ReconcileAction> {
    let mut actions = Vec::new();
    for membership in memberships {
        if membership.user_id == team.created_by {
            continue;
        }
        let mut user_roles: Vec<&RoleRecord> = active_roles
            .iter()
            .filter(|r| r.user_id == membership.user_id)
            .collect();
        user_roles.sort_by_key(|r| r.role_name);

        let mut has_member = false;
        for role in user_roles {
            if role.role_name == RoleName::Member {
                has_member = true;
            } else {
                actions.push(ReconcileAction::Delete((*role).clone()));
            }
        }
        if !has_member {
            actions.push(ReconcileAction::Create(NewRole {
                user_id: membership.user_id.clone(),
                team_id: team.id.clone(),
                role_name: RoleName::Member,
            }));
        }
    }
    actions
}

/// Regular members whose role records are already correct: an active
/// `member` role is present, so no action is emitted. Feeds the `skipped`
/// counter.
pub fn satisfied_member_roles(
    team: &Team,
    memberships: &[Membership],
    active_roles: &[RoleRecord],
) -> u64 {
    memberships
        .iter()
        .filter(|m| m.user_id != team.created_by)
        .filter(|m| {
            active_roles
                .iter()
                .any(|r| r.user_id == m.user_id && r.role_name == RoleName::Member)
        })
        .count() as u64
}

/// Global sweep: deactivate every active role whose `(user, team)` pair has
/// no membership record. Runs once, after all teams, against the full role
/// set.
pub fn audit_lingering_roles(
    active_roles: &[RoleRecord],
    memberships: &[Membership],
) -> Vec<ReconcileAction> {
    let existing: HashSet<(&str, &str)> = memberships
        .iter()
        .map(|m| (m.user_id.0.as_str(), m.team_id.0.as_str()))
        .collect();

    active_roles
        .iter()
        .filter(|r| !existing.contains(&(r.user_id.0.as_str(), r.team_id.0.as_str())))
        .map(|r| ReconcileAction::Deactivate(r.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
