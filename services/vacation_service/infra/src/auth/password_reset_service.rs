use async_trait::async_trait;
use shared_error::AppError;
use shared_rate_limit::LoginLockout;
use shared_types::SharedClock;
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;
use vacation_service_core::domains::audit::domain::{
    model::{actions, NewAuditEvent},
    repository::AuditSink,
};
use vacation_service_core::domains::auth::domain::{
    model::PasswordResetToken,
    repository::{PasswordResetRepository, SessionRepository},
    service::PasswordResetService,
};
use vacation_service_core::domains::auth::utils::{
    password::{validate_password_policy, PasswordHasher},
    token::{generate_opaque_token, hash_token},
};
use vacation_service_core::domains::identity::domain::repository::UserRepository;

use super::smtp_sender::{EmailContent, EmailSender};

/// Implementation of PasswordResetService
pub struct PasswordResetServiceImpl<UR, RR, SR>
where
    UR: UserRepository,
    RR: PasswordResetRepository,
    SR: SessionRepository,
{
    user_repo: UR,
    reset_repo: RR,
    session_repo: SR,
    hasher: Arc<PasswordHasher>,
    lockout: LoginLockout,
    mailer: Arc<dyn EmailSender>,
    audit: Arc<dyn AuditSink>,
    clock: SharedClock,
    reset_token_lifetime: i64,
}

impl<UR, RR, SR> PasswordResetServiceImpl<UR, RR, SR>
where
    UR: UserRepository,
    RR: PasswordResetRepository,
    SR: SessionRepository,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: UR,
        reset_repo: RR,
        session_repo: SR,
        hasher: Arc<PasswordHasher>,
        lockout: LoginLockout,
        mailer: Arc<dyn EmailSender>,
        audit: Arc<dyn AuditSink>,
        clock: SharedClock,
        reset_token_lifetime: i64,
    ) -> Self {
        Self {
            user_repo,
            reset_repo,
            session_repo,
            hasher,
            lockout,
            mailer,
            audit,
            clock,
            reset_token_lifetime,
        }
    }
}

#[async_trait]
impl<UR, RR, SR> PasswordResetService for PasswordResetServiceImpl<UR, RR, SR>
where
    UR: UserRepository + Send + Sync,
    RR: PasswordResetRepository + Send + Sync,
    SR: SessionRepository + Send + Sync,
{
    async fn request_reset(
        &self,
        email: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<(), AppError> {
        let now = self.clock.now();

        // Whatever happens below, the caller sees success — this endpoint
        // must not confirm whether an email has an account.
        let Some(user) = self.user_repo.find_active_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        // One live reset token per user.
        self.reset_repo.invalidate_for_user(user.user_id, now).await?;

        let (raw_token, token_hash) = generate_opaque_token();
        let token = PasswordResetToken {
            token_id: Uuid::now_v7(),
            company_id: user.company_id,
            user_id: user.user_id,
            token_hash,
            expires_at: now + chrono::Duration::seconds(self.reset_token_lifetime),
            used_at: None,
            created_at: now,
        };
        self.reset_repo.create(&token).await?;

        self.audit
            .record(
                NewAuditEvent::new(user.company_id, actions::PASSWORD_RESET_REQUESTED, "user")
                    .entity(user.user_id)
                    .client(ip_address, user_agent),
            )
            .await?;

        if self.mailer.is_available() {
            let mailer = Arc::clone(&self.mailer);
            let content = EmailContent {
                to: user.email.clone(),
                subject: "Password reset".to_string(),
                text_body: format!(
                    "A password reset was requested for your account.\n\n\
                     Use this token to set a new password: {}\n\n\
                     If you did not request this, you can ignore this message.",
                    raw_token
                ),
            };
            tokio::spawn(async move {
                if let Err(e) = mailer.send(content).await {
                    tracing::warn!("Failed to send reset mail: {}", e);
                }
            });
        }

        Ok(())
    }

    async fn confirm_reset(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let now = self.clock.now();
        let token_hash = hash_token(token);

        let record = self
            .reset_repo
            .find_by_hash(&token_hash)
            .await?
            .ok_or_else(|| AppError::NotAuthenticated("invalid or expired reset token".into()))?;

        if !record.is_valid(now) {
            return Err(AppError::NotAuthenticated("invalid or expired reset token".into()));
        }

        validate_password_policy(new_password)?;

        let user = self
            .user_repo
            .find_by_id(record.company_id, record.user_id)
            .await?
            .ok_or_else(|| AppError::NotAuthenticated("account is disabled or gone".into()))?;

        // Consume before writing the new hash; losing the race to a
        // concurrent confirm means this attempt changes nothing.
        let consumed = self.reset_repo.mark_used(record.token_id, now).await?;
        if !consumed {
            return Err(AppError::NotAuthenticated("invalid or expired reset token".into()));
        }

        let hasher = Arc::clone(&self.hasher);
        let password = new_password.to_string();
        let new_hash = task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

        self.user_repo
            .set_password_hash(user.user_id, &new_hash)
            .await?;

        let revoked = self
            .session_repo
            .revoke_all_for_user(user.user_id, now)
            .await?;

        // A successful out-of-band reset releases the lockout latch.
        self.lockout.clear(&user.email).await;

        tracing::info!(
            user_id = %user.user_id,
            sessions_revoked = %revoked,
            "Password reset completed"
        );

        self.audit
            .record(
                NewAuditEvent::new(user.company_id, actions::PASSWORD_RESET_COMPLETED, "user")
                    .actor(user.user_id)
                    .entity(user.user_id),
            )
            .await?;

        Ok(())
    }
}
