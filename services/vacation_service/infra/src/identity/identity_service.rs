use async_trait::async_trait;
use chrono::Utc;
use shared_auth::{authorize, check_same_company, Action, Principal, Resource, Role};
use shared_error::AppError;
use std::sync::Arc;
use uuid::Uuid;
use vacation_service_core::domains::audit::domain::{
    model::{actions, NewAuditEvent},
    repository::AuditSink,
};
use vacation_service_core::domains::identity::domain::{
    repository::{CompanyRepository, MembershipRepository, OrgRepository, UserRepository},
    service::IdentityService,
};
use vacation_service_core::domains::auth::domain::repository::SessionRepository;
use vacation_service_core::domains::identity::dto::{
    CompanyResp, FunctionResp, TeamResp, UpdateUserReq, UserFilter, UserInfo, UserListResp,
};

/// Identity service implementation
pub struct IdentityServiceImpl<UR, CR, OR, MR, SR>
where
    UR: UserRepository,
    CR: CompanyRepository,
    OR: OrgRepository,
    MR: MembershipRepository,
    SR: SessionRepository,
{
    user_repo: UR,
    company_repo: CR,
    org_repo: OR,
    membership_repo: MR,
    session_repo: SR,
    audit: Arc<dyn AuditSink>,
}

impl<UR, CR, OR, MR, SR> IdentityServiceImpl<UR, CR, OR, MR, SR>
where
    UR: UserRepository,
    CR: CompanyRepository,
    OR: OrgRepository,
    MR: MembershipRepository,
    SR: SessionRepository,
{
    pub fn new(
        user_repo: UR,
        company_repo: CR,
        org_repo: OR,
        membership_repo: MR,
        session_repo: SR,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            user_repo,
            company_repo,
            org_repo,
            membership_repo,
            session_repo,
            audit,
        }
    }

    /// Object-level read check for a user row already fetched within the
    /// principal's company: self scope needs identity, team scope needs an
    /// active membership intersection.
    async fn check_user_in_scope(
        &self,
        principal: &Principal,
        target_user_id: Uuid,
        scope: &shared_auth::ScopePredicate,
    ) -> Result<(), AppError> {
        if let Some(self_id) = scope.user_id {
            if target_user_id != self_id {
                return Err(AppError::NotAuthorized("outside your scope".into()));
            }
        }
        if let Some(team_ids) = &scope.team_ids {
            if target_user_id != principal.user_id
                && !self
                    .membership_repo
                    .user_in_teams(target_user_id, team_ids)
                    .await?
            {
                return Err(AppError::NotAuthorized("user is not on a managed team".into()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<UR, CR, OR, MR, SR> IdentityService for IdentityServiceImpl<UR, CR, OR, MR, SR>
where
    UR: UserRepository + Send + Sync,
    CR: CompanyRepository + Send + Sync,
    OR: OrgRepository + Send + Sync,
    MR: MembershipRepository + Send + Sync,
    SR: SessionRepository + Send + Sync,
{
    async fn me(&self, principal: &Principal) -> Result<UserInfo, AppError> {
        let user = self
            .user_repo
            .find_by_id(principal.company_id, principal.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))?;

        Ok(UserInfo::from(&user))
    }

    async fn get_user(&self, principal: &Principal, user_id: Uuid) -> Result<UserInfo, AppError> {
        let scope = authorize(principal, Action::Read, Resource::User)?;

        let user = self
            .user_repo
            .find_by_id(principal.company_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))?;

        self.check_user_in_scope(principal, user.user_id, &scope)
            .await?;

        Ok(UserInfo::from(&user))
    }

    async fn list_users(
        &self,
        principal: &Principal,
        filter: UserFilter,
        page: i32,
        page_size: i32,
    ) -> Result<UserListResp, AppError> {
        let scope = authorize(principal, Action::List, Resource::User)?;

        let (users, total) = self.user_repo.list(&scope, &filter, page, page_size).await?;

        Ok(UserListResp {
            users: users.iter().map(UserInfo::from).collect(),
            total,
            page,
            page_size,
        })
    }

    async fn update_user(
        &self,
        principal: &Principal,
        user_id: Uuid,
        req: UpdateUserReq,
    ) -> Result<UserInfo, AppError> {
        let scope = authorize(principal, Action::Update, Resource::User)?;

        let mut user = self
            .user_repo
            .find_by_id_any_status(principal.company_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))?;

        self.check_user_in_scope(principal, user.user_id, &scope)
            .await?;

        // Role and activation changes are admin-only even when the row is
        // otherwise in scope (self updates).
        if (req.role.is_some() || req.is_active.is_some()) && !principal.is_admin() {
            return Err(AppError::NotAuthorized(
                "role and activation changes require admin".into(),
            ));
        }

        let old_role = user.role;

        if let Some(first_name) = req.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        if let Some(is_active) = req.is_active {
            user.is_active = is_active;
        }

        let updated = self.user_repo.update(&user).await?;

        if old_role != updated.role {
            // Demotions take effect immediately: the next request re-reads
            // the role, and standing sessions lose elevated access.
            self.audit
                .record(
                    NewAuditEvent::new(principal.company_id, actions::USER_ROLE_CHANGED, "user")
                        .actor(principal.user_id)
                        .entity(updated.user_id)
                        .before(serde_json::json!({"role": old_role}))
                        .after(serde_json::json!({"role": updated.role})),
                )
                .await?;
        } else {
            self.audit
                .record(
                    NewAuditEvent::new(principal.company_id, actions::USER_UPDATED, "user")
                        .actor(principal.user_id)
                        .entity(updated.user_id),
                )
                .await?;
        }

        Ok(UserInfo::from(&updated))
    }

    async fn soft_delete_user(
        &self,
        principal: &Principal,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        if principal.role != Role::Admin {
            return Err(AppError::NotAuthorized("user deletion requires admin".into()));
        }
        authorize(principal, Action::Delete, Resource::User)?;

        let deleted = self
            .user_repo
            .soft_delete(principal.company_id, user_id)
            .await?;
        if !deleted {
            return Err(AppError::NotFound("user".into()));
        }

        let revoked = self
            .session_repo
            .revoke_all_for_user(user_id, Utc::now())
            .await?;

        tracing::info!(
            target_user_id = %user_id,
            company_id = %principal.company_id,
            sessions_revoked = %revoked,
            "User soft-deleted"
        );

        self.audit
            .record(
                NewAuditEvent::new(principal.company_id, actions::USER_DELETED, "user")
                    .actor(principal.user_id)
                    .entity(user_id),
            )
            .await?;

        Ok(())
    }

    async fn get_company(
        &self,
        principal: &Principal,
        company_id: Uuid,
    ) -> Result<CompanyResp, AppError> {
        authorize(principal, Action::Read, Resource::Company)?;
        check_same_company(principal, company_id)?;

        let company = self
            .company_repo
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("company".into()))?;

        Ok(CompanyResp::from(&company))
    }

    async fn list_functions(
        &self,
        principal: &Principal,
        company_id: Uuid,
    ) -> Result<Vec<FunctionResp>, AppError> {
        authorize(principal, Action::List, Resource::Function)?;
        check_same_company(principal, company_id)?;

        let functions = self.org_repo.list_functions(company_id).await?;
        Ok(functions.iter().map(FunctionResp::from).collect())
    }

    async fn list_teams(
        &self,
        principal: &Principal,
        company_id: Uuid,
    ) -> Result<Vec<TeamResp>, AppError> {
        authorize(principal, Action::List, Resource::Team)?;
        check_same_company(principal, company_id)?;

        let teams = self.org_repo.list_teams(company_id).await?;
        Ok(teams.iter().map(TeamResp::from).collect())
    }

    async fn get_team(&self, principal: &Principal, team_id: Uuid) -> Result<TeamResp, AppError> {
        authorize(principal, Action::Read, Resource::Team)?;

        let team = self
            .org_repo
            .find_team(principal.company_id, team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("team".into()))?;

        Ok(TeamResp::from(&team))
    }
}
