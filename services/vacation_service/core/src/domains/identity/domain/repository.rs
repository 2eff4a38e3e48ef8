use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_auth::ScopePredicate;
use shared_error::AppError;
use uuid::Uuid;

use super::model::{Company, Function, ManagerAssignment, Team, TeamMembership, User};
use crate::domains::identity::dto::UserFilter;

/// User persistence. Active-row filtering (`deleted_at IS NULL`) is the
/// repository's responsibility so call sites cannot forget it.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Lookup by email among active, non-deleted users. Email is globally
    /// unique for those rows, so no tenant context is needed at login.
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Tenant-scoped lookup by id (active users only).
    async fn find_by_id(&self, company_id: Uuid, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Tenant-scoped lookup including inactive users (admin views).
    async fn find_by_id_any_status(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<User>, AppError>;

    async fn create(&self, user: &User) -> Result<User, AppError>;

    async fn update(&self, user: &User) -> Result<User, AppError>;

    /// List users visible under `scope`, filtered and paginated, newest
    /// first.
    async fn list(
        &self,
        scope: &ScopePredicate,
        filter: &UserFilter,
        page: i32,
        page_size: i32,
    ) -> Result<(Vec<User>, i64), AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError>;

    async fn update_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Soft delete: sets `deleted_at`, `is_active = false`. Historical rows
    /// keep their referential integrity.
    async fn soft_delete(&self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn find_by_id(&self, company_id: Uuid) -> Result<Option<Company>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError>;

    async fn create(&self, company: &Company) -> Result<Company, AppError>;
}

/// Functions and teams — the org chart below a company.
#[async_trait]
pub trait OrgRepository: Send + Sync {
    async fn find_function(
        &self,
        company_id: Uuid,
        function_id: Uuid,
    ) -> Result<Option<Function>, AppError>;

    async fn list_functions(&self, company_id: Uuid) -> Result<Vec<Function>, AppError>;

    async fn create_function(&self, function: &Function) -> Result<Function, AppError>;

    async fn find_team(&self, company_id: Uuid, team_id: Uuid) -> Result<Option<Team>, AppError>;

    async fn list_teams(&self, company_id: Uuid) -> Result<Vec<Team>, AppError>;

    async fn create_team(&self, team: &Team) -> Result<Team, AppError>;

    /// The company's "general" function, materialized on first use. Invites
    /// without an explicit function attach their user here.
    async fn ensure_default_function(&self, company_id: Uuid) -> Result<Function, AppError>;
}

/// Team memberships and manager assignments.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Active team ids for a user (`left_at IS NULL`).
    async fn active_team_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    /// Teams a manager is assigned to.
    async fn managed_team_ids(&self, manager_user_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    async fn add_member(&self, membership: &TeamMembership) -> Result<TeamMembership, AppError>;

    /// Close an active membership by setting `left_at`; returns false when no
    /// active membership existed.
    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    async fn assign_manager(
        &self,
        assignment: &ManagerAssignment,
    ) -> Result<ManagerAssignment, AppError>;

    /// Whether `user_id` holds an active membership in any of `team_ids`.
    async fn user_in_teams(&self, user_id: Uuid, team_ids: &[Uuid]) -> Result<bool, AppError>;
}
