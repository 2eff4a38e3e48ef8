//! Central permission oracle.
//!
//! Every core operation calls [`authorize`] at its top with the resolved
//! [`Principal`] and the operation descriptor, and composes the returned
//! [`ScopePredicate`] into its queries. No operation may skip this check.

use crate::principal::{Principal, Role};
use shared_error::AppError;
use uuid::Uuid;

/// Resource types the kernel knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Company,
    Function,
    Team,
    VacationRequest,
    VacationPeriod,
    VacationAllocation,
    AuditEvent,
    Invite,
}

/// Operation verbs, including the vacation-specific transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
    Approve,
    Reject,
    Cancel,
    ManageMembers,
}

/// Structured filter describing the rows a principal may touch.
///
/// Always tenant-bound; `team_ids`/`user_id` narrow further. Query builders
/// are required to consume this — there is no tenant-less query path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePredicate {
    pub company_id: Uuid,
    /// Restrict to rows whose owner has an active membership in one of these
    /// teams (manager scope). None = no team restriction.
    pub team_ids: Option<Vec<Uuid>>,
    /// Restrict to rows owned by this user (self scope). None = no owner
    /// restriction.
    pub user_id: Option<Uuid>,
}

impl ScopePredicate {
    pub fn company_wide(company_id: Uuid) -> Self {
        Self {
            company_id,
            team_ids: None,
            user_id: None,
        }
    }

    pub fn teams(company_id: Uuid, team_ids: Vec<Uuid>) -> Self {
        Self {
            company_id,
            team_ids: Some(team_ids),
            user_id: None,
        }
    }

    pub fn own(company_id: Uuid, user_id: Uuid) -> Self {
        Self {
            company_id,
            team_ids: None,
            user_id: Some(user_id),
        }
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(ScopePredicate),
    Deny(&'static str),
}

/// Resolve the permission matrix for (principal, action, resource).
///
/// Pure given the principal snapshot: same inputs, same decision.
pub fn decide(principal: &Principal, action: Action, resource: Resource) -> Decision {
    use Action::*;
    use Resource::*;

    let company = principal.company_id;
    let admin_scope = ScopePredicate::company_wide(company);
    let manager_scope = || ScopePredicate::teams(company, principal.managed_team_ids.clone());
    let own_scope = || ScopePredicate::own(company, principal.user_id);

    match (principal.role, resource, action) {
        // Admin: unrestricted within the tenant. Audit events stay
        // company-scoped and read-only even for admin.
        (Role::Admin, AuditEvent, List | Read) => Decision::Allow(admin_scope),
        (Role::Admin, AuditEvent, _) => Decision::Deny("audit events are append-only"),
        (Role::Admin, _, _) => Decision::Allow(admin_scope),

        // Manager
        (Role::Manager, User, List | Read) => Decision::Allow(manager_scope()),
        (Role::Manager, User, Update) => Decision::Allow(own_scope()),
        (Role::Manager, Company | Function | Team, List | Read) => Decision::Allow(admin_scope),
        (Role::Manager, Team, ManageMembers) => {
            if principal.managed_team_ids.is_empty() {
                Decision::Deny("no managed teams")
            } else {
                Decision::Allow(manager_scope())
            }
        },
        (Role::Manager, VacationRequest, List | Read) => Decision::Allow(manager_scope()),
        (Role::Manager, VacationRequest, Approve | Reject) => {
            if principal.managed_team_ids.is_empty() {
                Decision::Deny("no managed teams")
            } else {
                Decision::Allow(manager_scope())
            }
        },
        (Role::Manager, VacationRequest, Create) => Decision::Allow(own_scope()),
        (Role::Manager, VacationRequest, Update | Cancel) => Decision::Allow(own_scope()),
        (Role::Manager, VacationPeriod, List | Read) => Decision::Allow(admin_scope),
        (Role::Manager, VacationAllocation, List | Read) => Decision::Allow(manager_scope()),
        (Role::Manager, _, _) => Decision::Deny("operation requires admin role"),

        // User
        (Role::User, User, Read | Update) => Decision::Allow(own_scope()),
        (Role::User, Company | Function | Team, List | Read) => Decision::Allow(admin_scope),
        (Role::User, VacationRequest, List | Read | Create | Update | Cancel) => {
            Decision::Allow(own_scope())
        },
        (Role::User, VacationPeriod, List | Read) => Decision::Allow(admin_scope),
        (Role::User, VacationAllocation, List | Read) => Decision::Allow(own_scope()),
        (Role::User, _, _) => Decision::Deny("operation requires elevated role"),
    }
}

/// [`decide`] raised into the error channel: Deny becomes `NotAuthorized`.
pub fn authorize(
    principal: &Principal,
    action: Action,
    resource: Resource,
) -> Result<ScopePredicate, AppError> {
    match decide(principal, action, resource) {
        Decision::Allow(scope) => Ok(scope),
        Decision::Deny(reason) => {
            tracing::debug!(
                user_id = %principal.user_id,
                company_id = %principal.company_id,
                role = %principal.role,
                reason = reason,
                "Authorization denied"
            );
            Err(AppError::NotAuthorized(reason.to_string()))
        },
    }
}

/// Object-level tenant check. Every entity the kernel touches must belong to
/// the principal's company; mismatches surface as not-found so foreign ids
/// do not leak existence.
pub fn check_same_company(principal: &Principal, entity_company_id: Uuid) -> Result<(), AppError> {
    if principal.company_id != entity_company_id {
        return Err(AppError::CrossTenantAccess);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, managed: Vec<Uuid>) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            role,
            managed_team_ids: managed,
        }
    }

    #[test]
    fn admin_is_company_scoped_everywhere() {
        let p = principal(Role::Admin, vec![]);
        for resource in [
            Resource::User,
            Resource::Company,
            Resource::Team,
            Resource::VacationRequest,
            Resource::VacationPeriod,
            Resource::Invite,
        ] {
            match decide(&p, Action::Create, resource) {
                Decision::Allow(scope) => {
                    assert_eq!(scope.company_id, p.company_id);
                    assert_eq!(scope.team_ids, None);
                    assert_eq!(scope.user_id, None);
                },
                Decision::Deny(reason) => panic!("admin denied on {:?}: {}", resource, reason),
            }
        }
    }

    #[test]
    fn admin_cannot_mutate_audit_events() {
        let p = principal(Role::Admin, vec![]);
        assert!(matches!(
            decide(&p, Action::Update, Resource::AuditEvent),
            Decision::Deny(_)
        ));
        assert!(matches!(
            decide(&p, Action::List, Resource::AuditEvent),
            Decision::Allow(_)
        ));
    }

    #[test]
    fn manager_approval_scope_is_managed_teams() {
        let team = Uuid::new_v4();
        let p = principal(Role::Manager, vec![team]);
        match decide(&p, Action::Approve, Resource::VacationRequest) {
            Decision::Allow(scope) => assert_eq!(scope.team_ids, Some(vec![team])),
            Decision::Deny(reason) => panic!("unexpected deny: {}", reason),
        }
    }

    #[test]
    fn manager_without_teams_cannot_approve() {
        let p = principal(Role::Manager, vec![]);
        assert!(matches!(
            decide(&p, Action::Approve, Resource::VacationRequest),
            Decision::Deny(_)
        ));
    }

    #[test]
    fn user_requests_are_self_scoped() {
        let p = principal(Role::User, vec![]);
        match decide(&p, Action::List, Resource::VacationRequest) {
            Decision::Allow(scope) => assert_eq!(scope.user_id, Some(p.user_id)),
            Decision::Deny(reason) => panic!("unexpected deny: {}", reason),
        }
    }

    #[test]
    fn user_cannot_approve_or_read_audit() {
        let p = principal(Role::User, vec![]);
        assert!(matches!(
            decide(&p, Action::Approve, Resource::VacationRequest),
            Decision::Deny(_)
        ));
        assert!(matches!(
            decide(&p, Action::List, Resource::AuditEvent),
            Decision::Deny(_)
        ));
        assert!(matches!(
            decide(&p, Action::Create, Resource::Invite),
            Decision::Deny(_)
        ));
    }

    #[test]
    fn manager_cannot_issue_invites() {
        let p = principal(Role::Manager, vec![Uuid::new_v4()]);
        assert!(matches!(
            decide(&p, Action::Create, Resource::Invite),
            Decision::Deny(_)
        ));
    }

    #[test]
    fn decision_is_pure() {
        let p = principal(Role::Manager, vec![Uuid::new_v4()]);
        let first = decide(&p, Action::Read, Resource::VacationRequest);
        let second = decide(&p, Action::Read, Resource::VacationRequest);
        assert_eq!(first, second);
    }

    #[test]
    fn cross_tenant_is_not_found() {
        let p = principal(Role::Admin, vec![]);
        let err = check_same_company(&p, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::CrossTenantAccess));
        assert!(check_same_company(&p, p.company_id).is_ok());
    }
}
