use shared_auth::{Principal, Role};
use shared_error::AppError;
use uuid::Uuid;
use vacation_service_core::domains::identity::domain::repository::{
    MembershipRepository, UserRepository,
};

/// Builds the per-request [`Principal`].
///
/// Role and managed-team set are read from the store on every call, so a
/// token issued before a demotion authorizes at the user's current level.
pub struct PgPrincipalResolver<UR, MR>
where
    UR: UserRepository,
    MR: MembershipRepository,
{
    user_repo: UR,
    membership_repo: MR,
}

impl<UR, MR> PgPrincipalResolver<UR, MR>
where
    UR: UserRepository,
    MR: MembershipRepository,
{
    pub fn new(user_repo: UR, membership_repo: MR) -> Self {
        Self {
            user_repo,
            membership_repo,
        }
    }

    pub async fn resolve(&self, user_id: Uuid, company_id: Uuid) -> Result<Principal, AppError> {
        let user = self
            .user_repo
            .find_by_id(company_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotAuthenticated("account is disabled or gone".into()))?;

        let managed_team_ids = match user.role {
            Role::Manager => self.membership_repo.managed_team_ids(user.user_id).await?,
            Role::Admin | Role::User => Vec::new(),
        };

        Ok(Principal {
            user_id: user.user_id,
            company_id: user.company_id,
            role: user.role,
            managed_team_ids,
        })
    }
}
