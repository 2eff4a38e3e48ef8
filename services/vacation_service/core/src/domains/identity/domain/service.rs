use async_trait::async_trait;
use shared_auth::Principal;
use shared_error::AppError;
use uuid::Uuid;

use crate::domains::identity::dto::{
    CompanyResp, FunctionResp, TeamResp, UpdateUserReq, UserFilter, UserInfo, UserListResp,
};

/// Identity operations. Every method takes the calling [`Principal`]
/// explicitly; authorization happens at the top of each implementation.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// The caller's own profile.
    async fn me(&self, principal: &Principal) -> Result<UserInfo, AppError>;

    async fn get_user(&self, principal: &Principal, user_id: Uuid) -> Result<UserInfo, AppError>;

    async fn list_users(
        &self,
        principal: &Principal,
        filter: UserFilter,
        page: i32,
        page_size: i32,
    ) -> Result<UserListResp, AppError>;

    async fn update_user(
        &self,
        principal: &Principal,
        user_id: Uuid,
        req: UpdateUserReq,
    ) -> Result<UserInfo, AppError>;

    /// Admin-only soft delete; revokes the target's refresh tokens.
    async fn soft_delete_user(&self, principal: &Principal, user_id: Uuid)
        -> Result<(), AppError>;

    async fn get_company(
        &self,
        principal: &Principal,
        company_id: Uuid,
    ) -> Result<CompanyResp, AppError>;

    async fn list_functions(
        &self,
        principal: &Principal,
        company_id: Uuid,
    ) -> Result<Vec<FunctionResp>, AppError>;

    async fn list_teams(
        &self,
        principal: &Principal,
        company_id: Uuid,
    ) -> Result<Vec<TeamResp>, AppError>;

    async fn get_team(&self, principal: &Principal, team_id: Uuid) -> Result<TeamResp, AppError>;
}
