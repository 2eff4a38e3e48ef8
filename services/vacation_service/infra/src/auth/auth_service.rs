use async_trait::async_trait;
use shared_auth::Principal;
use shared_error::AppError;
use shared_jwt::{encode_jwt, Claims};
use shared_rate_limit::{KeyGenerator, LoginLockout, RateCategory, RateGate};
use shared_types::SharedClock;
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;
use vacation_service_core::domains::audit::domain::{
    model::{actions, NewAuditEvent},
    repository::AuditSink,
};
use vacation_service_core::domains::auth::domain::{
    model::RefreshTokenRecord,
    repository::SessionRepository,
    service::AuthService,
};
use vacation_service_core::domains::auth::dto::{ChangePasswordReq, IssuedSession, LoginReq};
use vacation_service_core::domains::auth::utils::{
    password::{validate_password_policy, PasswordHasher},
    token::{generate_opaque_token, hash_token},
};
use vacation_service_core::domains::identity::domain::{
    model::User, repository::UserRepository,
};
use vacation_service_core::domains::identity::dto::UserInfo;

/// Auth service implementation: credential verification, token issuance,
/// refresh rotation with replay detection, password changes.
pub struct AuthServiceImpl<UR, SR>
where
    UR: UserRepository,
    SR: SessionRepository,
{
    user_repo: UR,
    session_repo: SR,
    hasher: Arc<PasswordHasher>,
    lockout: LoginLockout,
    rate_gate: RateGate,
    audit: Arc<dyn AuditSink>,
    clock: SharedClock,
    jwt_secret: Vec<u8>,
    access_token_lifetime: i64,
    refresh_token_lifetime: i64,
    remember_me_lifetime: i64,
}

impl<UR, SR> AuthServiceImpl<UR, SR>
where
    UR: UserRepository,
    SR: SessionRepository,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: UR,
        session_repo: SR,
        hasher: Arc<PasswordHasher>,
        lockout: LoginLockout,
        rate_gate: RateGate,
        audit: Arc<dyn AuditSink>,
        clock: SharedClock,
        jwt_secret: Vec<u8>,
        access_token_lifetime: i64,
        refresh_token_lifetime: i64,
        remember_me_lifetime: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            hasher,
            lockout,
            rate_gate,
            audit,
            clock,
            jwt_secret,
            access_token_lifetime,
            refresh_token_lifetime,
            remember_me_lifetime,
        }
    }

    /// Mint an access token and a fresh refresh record for `user`.
    async fn issue_session(
        &self,
        user: &User,
        remember_me: bool,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<IssuedSession, AppError> {
        let now = self.clock.now();

        let claims = Claims::new_access(
            user.user_id,
            user.company_id,
            user.role.to_string(),
            now,
            self.access_token_lifetime,
        );
        let access_token = encode_jwt(&claims, &self.jwt_secret)?;

        let (raw_refresh, refresh_hash) = generate_opaque_token();
        let lifetime = if remember_me {
            self.remember_me_lifetime
        } else {
            self.refresh_token_lifetime
        };
        let expires_at = now + chrono::Duration::seconds(lifetime);

        let record = RefreshTokenRecord {
            token_id: Uuid::now_v7(),
            company_id: user.company_id,
            user_id: user.user_id,
            token_hash: refresh_hash,
            expires_at,
            revoked_at: None,
            last_used_at: None,
            user_agent,
            ip_address,
            is_remember_me: remember_me,
            created_at: now,
        };
        self.session_repo.create(&record).await?;

        Ok(IssuedSession {
            access_token,
            expires_in: self.access_token_lifetime,
            refresh_token: raw_refresh,
            refresh_expires_at: expires_at,
            user: UserInfo::from(user),
        })
    }

    async fn verify_password_blocking(
        &self,
        encoded: String,
        password: String,
    ) -> Result<vacation_service_core::domains::auth::utils::password::Verification, AppError>
    {
        let hasher = Arc::clone(&self.hasher);
        task::spawn_blocking(move || hasher.verify(&encoded, &password))
            .await
            .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
    }

    async fn hash_password_blocking(&self, password: String) -> Result<String, AppError> {
        let hasher = Arc::clone(&self.hasher);
        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl<UR, SR> AuthService for AuthServiceImpl<UR, SR>
where
    UR: UserRepository + Send + Sync,
    SR: SessionRepository + Send + Sync,
{
    async fn login(
        &self,
        req: LoginReq,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<IssuedSession, AppError> {
        // The latch answers before credentials are even looked at, and
        // before the sliding window: a locked account reports locked, not
        // rate-limited.
        let status = self.lockout.check(&req.email).await;
        if status.is_locked {
            return Err(AppError::LoginLocked(status.remaining_seconds.unwrap_or(900)));
        }

        let key = KeyGenerator::ip_email_key(
            "login",
            ip_address.as_deref().unwrap_or("unknown"),
            &req.email,
        );
        let gate = self
            .rate_gate
            .check_and_record(RateCategory::Login, &key)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        if !gate.allowed {
            return Err(AppError::RateLimited(gate.retry_after));
        }

        let user = self.user_repo.find_active_by_email(&req.email).await?;

        let user = match user {
            Some(user) => user,
            None => {
                // Unknown email burns a hash verification so lookup misses
                // are not distinguishable by timing.
                let hasher = Arc::clone(&self.hasher);
                let password = req.password.clone();
                let _ = task::spawn_blocking(move || hasher.dummy_verify(&password)).await;
                self.lockout.record_failure(&req.email).await;
                return Err(AppError::InvalidCredential);
            },
        };

        let verification = match self
            .verify_password_blocking(user.password_hash.clone(), req.password.clone())
            .await
        {
            Ok(v) => v,
            Err(AppError::InvalidCredential) => {
                self.lockout.record_failure(&req.email).await;
                self.audit
                    .record(
                        NewAuditEvent::new(user.company_id, actions::LOGIN_FAILED, "user")
                            .entity(user.user_id)
                            .client(ip_address, user_agent),
                    )
                    .await?;
                return Err(AppError::InvalidCredential);
            },
            Err(e) => return Err(e),
        };

        self.lockout.clear(&req.email).await;

        // Parameters were strengthened since this hash was stored;
        // re-persist under current policy while we hold the cleartext.
        if verification.needs_rehash {
            let new_hash = self.hash_password_blocking(req.password.clone()).await?;
            self.user_repo
                .set_password_hash(user.user_id, &new_hash)
                .await?;
            tracing::info!(user_id = %user.user_id, "Password rehashed under current parameters");
        }

        self.user_repo
            .update_last_login(user.user_id, self.clock.now())
            .await?;

        let session = self
            .issue_session(&user, req.remember_me, ip_address.clone(), user_agent.clone())
            .await?;

        self.audit
            .record(
                NewAuditEvent::new(user.company_id, actions::LOGIN, "user")
                    .actor(user.user_id)
                    .entity(user.user_id)
                    .client(ip_address, user_agent),
            )
            .await?;

        Ok(session)
    }

    async fn refresh(
        &self,
        raw_refresh_token: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<IssuedSession, AppError> {
        let now = self.clock.now();
        let presented_hash = hash_token(raw_refresh_token);

        let record = self
            .session_repo
            .find_by_hash(&presented_hash)
            .await?
            .ok_or_else(|| AppError::NotAuthenticated("unknown refresh token".into()))?;

        // A revoked token coming back is a replay: assume the token leaked
        // and kill every session this user has.
        if record.is_revoked() {
            let revoked = self
                .session_repo
                .revoke_all_for_user(record.user_id, now)
                .await?;
            tracing::warn!(
                user_id = %record.user_id,
                sessions_revoked = %revoked,
                "Refresh token replay detected"
            );
            self.audit
                .record(
                    NewAuditEvent::new(record.company_id, actions::REFRESH_REPLAY, "refresh_token")
                        .entity(record.token_id)
                        .client(ip_address, user_agent),
                )
                .await?;
            return Err(AppError::RefreshReplayDetected);
        }

        if record.is_expired(now) {
            return Err(AppError::Expired);
        }

        // The refresh window is keyed by user, which is only known after the
        // record lookup.
        let gate = self
            .rate_gate
            .check_and_record(RateCategory::Refresh, &record.user_id.to_string())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        if !gate.allowed {
            return Err(AppError::RateLimited(gate.retry_after));
        }

        let user = self
            .user_repo
            .find_by_id(record.company_id, record.user_id)
            .await?
            .ok_or_else(|| AppError::NotAuthenticated("account is disabled or gone".into()))?;

        // Rotation: the revoke is guarded, so two concurrent exchanges of
        // the same token cannot both win — the loser lands on the replay
        // path on its next attempt.
        let newly_revoked = self.session_repo.revoke(record.token_id, now).await?;
        if !newly_revoked {
            let revoked = self
                .session_repo
                .revoke_all_for_user(record.user_id, now)
                .await?;
            tracing::warn!(
                user_id = %record.user_id,
                sessions_revoked = %revoked,
                "Concurrent refresh exchange detected"
            );
            return Err(AppError::RefreshReplayDetected);
        }
        self.session_repo.touch_last_used(record.token_id, now).await?;

        let session = self
            .issue_session(
                &user,
                record.is_remember_me,
                ip_address.clone(),
                user_agent.clone(),
            )
            .await?;

        self.audit
            .record(
                NewAuditEvent::new(user.company_id, actions::TOKEN_REFRESHED, "refresh_token")
                    .actor(user.user_id)
                    .entity(record.token_id)
                    .client(ip_address, user_agent),
            )
            .await?;

        Ok(session)
    }

    async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError> {
        let presented_hash = hash_token(raw_refresh_token);

        if let Some(record) = self.session_repo.find_by_hash(&presented_hash).await? {
            self.session_repo.revoke(record.token_id, self.clock.now()).await?;
            self.audit
                .record(
                    NewAuditEvent::new(record.company_id, actions::LOGOUT, "refresh_token")
                        .actor(record.user_id)
                        .entity(record.token_id),
                )
                .await?;
        }

        Ok(())
    }

    async fn change_password(
        &self,
        principal: &Principal,
        req: ChangePasswordReq,
    ) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_id(principal.company_id, principal.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into()))?;

        self.verify_password_blocking(user.password_hash.clone(), req.current_password)
            .await?;

        validate_password_policy(&req.new_password)?;

        let new_hash = self.hash_password_blocking(req.new_password).await?;
        self.user_repo
            .set_password_hash(user.user_id, &new_hash)
            .await?;

        // A changed password invalidates every standing session.
        let revoked = self
            .session_repo
            .revoke_all_for_user(user.user_id, self.clock.now())
            .await?;
        self.lockout.clear(&user.email).await;

        tracing::info!(
            user_id = %user.user_id,
            sessions_revoked = %revoked,
            "Password changed"
        );

        self.audit
            .record(
                NewAuditEvent::new(user.company_id, actions::PASSWORD_CHANGED, "user")
                    .actor(user.user_id)
                    .entity(user.user_id),
            )
            .await?;

        Ok(())
    }
}
