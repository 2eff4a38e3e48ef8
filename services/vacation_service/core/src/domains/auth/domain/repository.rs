use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use uuid::Uuid;

use super::model::{InviteToken, PasswordResetToken, RefreshTokenRecord};

/// Refresh-token persistence. Lookups are by token hash only (I5).
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, record: &RefreshTokenRecord) -> Result<RefreshTokenRecord, AppError>;

    /// Lookup by hash regardless of liveness; rotation needs to see revoked
    /// rows to detect replay.
    async fn find_by_hash(&self, token_hash: &str)
        -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Revoke one token. Guarded on `revoked_at IS NULL`; returns false when
    /// the row was already revoked, which rotation treats as replay.
    async fn revoke(&self, token_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError>;

    /// Revoke every live refresh token for a user (logout-all, password
    /// change, replay response). Returns the number revoked.
    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>)
        -> Result<u64, AppError>;

    async fn touch_last_used(&self, token_id: Uuid, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Remove rows expired or long-revoked; used by the cleanup ticker.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, invite: &InviteToken) -> Result<InviteToken, AppError>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<InviteToken>, AppError>;

    async fn find_by_id(
        &self,
        company_id: Uuid,
        invite_id: Uuid,
    ) -> Result<Option<InviteToken>, AppError>;

    /// Pending invite for (company, email), if any; used to block duplicates.
    async fn find_pending_by_email(
        &self,
        company_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<InviteToken>, AppError>;

    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InviteToken>, AppError>;

    /// Mark used; the guard `used_at IS NULL` makes acceptance single-shot.
    /// Returns false when the invite was already used.
    async fn mark_used(&self, invite_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError>;

    async fn delete(&self, company_id: Uuid, invite_id: Uuid) -> Result<bool, AppError>;

    /// Replace token material for a resend; bumps expiry.
    async fn update_for_resend(
        &self,
        company_id: Uuid,
        invite_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<InviteToken, AppError>;
}

#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create(&self, token: &PasswordResetToken) -> Result<PasswordResetToken, AppError>;

    async fn find_by_hash(&self, token_hash: &str)
        -> Result<Option<PasswordResetToken>, AppError>;

    /// Single-shot consume; returns false when already used.
    async fn mark_used(&self, token_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError>;

    /// Invalidate outstanding reset tokens for a user (issued-before-reset).
    async fn invalidate_for_user(&self, user_id: Uuid, at: DateTime<Utc>)
        -> Result<u64, AppError>;
}
