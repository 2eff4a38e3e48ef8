use async_trait::async_trait;
use shared_auth::Principal;
use shared_error::AppError;
use uuid::Uuid;

use crate::domains::auth::dto::{
    AcceptInviteReq, ChangePasswordReq, CreateInviteReq, InviteResp, IssuedSession, LoginReq,
};
use crate::domains::identity::dto::UserInfo;

/// Authentication and session lifecycle.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and mint an access/refresh pair. Failed
    /// verifications feed the lockout latch; unknown emails burn a dummy
    /// hash verification to equalize timing.
    async fn login(
        &self,
        req: LoginReq,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<IssuedSession, AppError>;

    /// Rotate a refresh token: revoke the presented record, issue a new one.
    /// Replay of a revoked token revokes every session of that user.
    async fn refresh(
        &self,
        raw_refresh_token: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<IssuedSession, AppError>;

    /// Revoke the presented refresh token.
    async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError>;

    /// Verify the current password, apply policy to the new one, and revoke
    /// all refresh tokens on success.
    async fn change_password(
        &self,
        principal: &Principal,
        req: ChangePasswordReq,
    ) -> Result<(), AppError>;
}

/// Invitation lifecycle: issuance is admin-only; acceptance births the user.
#[async_trait]
pub trait InviteService: Send + Sync {
    async fn create_invite(
        &self,
        principal: &Principal,
        req: CreateInviteReq,
    ) -> Result<InviteResp, AppError>;

    /// Validate the invite, apply password policy, create the user with the
    /// invite's company/function/teams/role, and mark the invite used — all
    /// in one transaction.
    async fn accept_invite(&self, req: AcceptInviteReq) -> Result<UserInfo, AppError>;

    async fn list_invites(
        &self,
        principal: &Principal,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InviteResp>, AppError>;

    async fn revoke_invite(&self, principal: &Principal, invite_id: Uuid) -> Result<(), AppError>;

    /// Re-issue token material for a pending invite.
    async fn resend_invite(
        &self,
        principal: &Principal,
        invite_id: Uuid,
    ) -> Result<InviteResp, AppError>;
}

/// Forgot-password flow with opaque single-use tokens.
#[async_trait]
pub trait PasswordResetService: Send + Sync {
    /// Always answers success so the endpoint cannot be used to enumerate
    /// accounts; a token is issued only when the email matches an active user.
    async fn request_reset(
        &self,
        email: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<(), AppError>;

    /// Consume the token, apply policy, set the new password, revoke all
    /// refresh tokens, and clear the lockout latch.
    async fn confirm_reset(&self, token: &str, new_password: &str) -> Result<(), AppError>;
}
