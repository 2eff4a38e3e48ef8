//! Auth service flows against in-memory fakes: credential verification,
//! lockout behavior, refresh rotation, and replay handling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_auth::{Principal, Role, ScopePredicate};
use shared_error::AppError;
use shared_rate_limit::{LoginLockout, RateGate};
use shared_types::{SharedClock, SystemClock};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use vacation_service_core::domains::audit::domain::{
    model::{AuditEvent, NewAuditEvent},
    repository::{AuditFilter, AuditSink},
};
use vacation_service_core::domains::auth::domain::{
    model::RefreshTokenRecord,
    repository::SessionRepository,
    service::AuthService,
};
use vacation_service_core::domains::auth::dto::{ChangePasswordReq, LoginReq};
use vacation_service_core::domains::auth::utils::password::PasswordHasher;
use vacation_service_core::domains::identity::domain::{model::User, repository::UserRepository};
use vacation_service_core::domains::identity::dto::UserFilter;
use vacation_service_infra::auth::AuthServiceImpl;

#[derive(Clone, Default)]
struct InMemoryUsers {
    users: Arc<Mutex<Vec<User>>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| {
                u.email.eq_ignore_ascii_case(email) && u.is_active && u.deleted_at.is_none()
            })
            .cloned())
    }

    async fn find_by_id(&self, company_id: Uuid, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| {
                u.user_id == user_id
                    && u.company_id == company_id
                    && u.is_active
                    && u.deleted_at.is_none()
            })
            .cloned())
    }

    async fn find_by_id_any_status(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user_id == user_id && u.company_id == company_id)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        let slot = users
            .iter_mut()
            .find(|u| u.user_id == user.user_id)
            .ok_or_else(|| AppError::NotFound("user".into()))?;
        *slot = user.clone();
        Ok(user.clone())
    }

    async fn list(
        &self,
        scope: &ScopePredicate,
        _filter: &UserFilter,
        _page: i32,
        _page_size: i32,
    ) -> Result<(Vec<User>, i64), AppError> {
        let users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.company_id == scope.company_id)
            .cloned()
            .collect();
        let total = users.len() as i64;
        Ok((users, total))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) && u.deleted_at.is_none()))
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn soft_delete(&self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|u| u.user_id == user_id && u.company_id == company_id)
        {
            Some(user) => {
                user.deleted_at = Some(Utc::now());
                user.is_active = false;
                Ok(true)
            },
            None => Ok(false),
        }
    }
}

#[derive(Clone, Default)]
struct InMemorySessions {
    records: Arc<Mutex<Vec<RefreshTokenRecord>>>,
}

#[async_trait]
impl SessionRepository for InMemorySessions {
    async fn create(&self, record: &RefreshTokenRecord) -> Result<RefreshTokenRecord, AppError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(record.clone())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.token_hash == token_hash)
            .cloned())
    }

    async fn revoke(&self, token_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.token_id == token_id && r.revoked_at.is_none())
        {
            Some(record) => {
                record.revoked_at = Some(at);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut count = 0;
        for record in self.records.lock().unwrap().iter_mut() {
            if record.user_id == user_id && record.revoked_at.is_none() {
                record.revoked_at = Some(at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn touch_last_used(&self, token_id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(record) = self
            .records
            .lock()
            .unwrap()
            .iter_mut()
            .find(|r| r.token_id == token_id)
        {
            record.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.expires_at >= now);
        Ok((before - records.len()) as u64)
    }
}

#[derive(Clone, Default)]
struct RecordingAudit {
    events: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn record(&self, event: NewAuditEvent) -> Result<(), AppError> {
        self.events.lock().unwrap().push(event.action);
        Ok(())
    }

    async fn query(
        &self,
        _company_id: Uuid,
        _filter: &AuditFilter,
        _limit: i64,
        _offset: i64,
    ) -> Result<Vec<AuditEvent>, AppError> {
        Ok(vec![])
    }

    async fn find_by_id(
        &self,
        _company_id: Uuid,
        _event_id: Uuid,
    ) -> Result<Option<AuditEvent>, AppError> {
        Ok(None)
    }
}

const PASSWORD: &str = "Str0ng!Passw0rd!";

struct Fixture {
    service: AuthServiceImpl<InMemoryUsers, InMemorySessions>,
    sessions: InMemorySessions,
    audit: RecordingAudit,
    user_id: Uuid,
    company_id: Uuid,
}

fn fixture() -> Fixture {
    // Cheap hash parameters keep the suite fast.
    let hasher = Arc::new(PasswordHasher::with_params(1, 8, 1).unwrap());
    let users = InMemoryUsers::default();
    let sessions = InMemorySessions::default();
    let audit = RecordingAudit::default();
    let clock: SharedClock = Arc::new(SystemClock);

    let user_id = Uuid::now_v7();
    let company_id = Uuid::now_v7();
    let now = Utc::now();
    users.users.lock().unwrap().push(User {
        user_id,
        company_id,
        function_id: Uuid::now_v7(),
        email: "alice@co.example".to_string(),
        password_hash: hasher.hash(PASSWORD).unwrap(),
        first_name: "Alice".to_string(),
        last_name: "Doe".to_string(),
        role: Role::User,
        is_active: true,
        email_verified: true,
        last_login_at: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    });

    let service = AuthServiceImpl::new(
        users.clone(),
        sessions.clone(),
        hasher,
        LoginLockout::new(),
        RateGate::new(),
        Arc::new(audit.clone()),
        clock,
        b"test_secret_at_least_32_bytes_long!".to_vec(),
        900,
        604_800,
        2_592_000,
    );

    Fixture {
        service,
        sessions,
        audit,
        user_id,
        company_id,
    }
}

fn login_req(email: &str, password: &str) -> LoginReq {
    LoginReq {
        email: email.to_string(),
        password: password.to_string(),
        remember_me: false,
    }
}

#[tokio::test]
async fn login_issues_access_and_refresh_tokens() {
    let fx = fixture();

    let session = fx
        .service
        .login(login_req("alice@co.example", PASSWORD), None, None)
        .await
        .unwrap();

    assert_eq!(session.expires_in, 900);
    assert_eq!(session.user.email, "alice@co.example");

    // The refresh record stores the hash, never the raw token.
    let records = fx.sessions.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_ne!(records[0].token_hash, session.refresh_token);

    let claims = shared_jwt::decode_access_jwt(
        &session.access_token,
        b"test_secret_at_least_32_bytes_long!",
    )
    .unwrap();
    assert_eq!(claims.sub, fx.user_id);
    assert_eq!(claims.company_id, fx.company_id);
}

#[tokio::test]
async fn unknown_email_reports_invalid_credential() {
    let fx = fixture();

    let err = fx
        .service
        .login(login_req("nobody@co.example", PASSWORD), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredential));
}

#[tokio::test]
async fn sixth_consecutive_failure_reports_locked_even_with_correct_password() {
    let fx = fixture();

    for _ in 0..5 {
        let err = fx
            .service
            .login(login_req("alice@co.example", "wrong-password!"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential));
    }

    // The latch answers before credential verification.
    let err = fx
        .service
        .login(login_req("alice@co.example", PASSWORD), None, None)
        .await
        .unwrap_err();
    match err {
        AppError::LoginLocked(retry_after) => assert_eq!(retry_after, 900),
        other => panic!("expected LoginLocked, got {:?}", other),
    }
}

#[tokio::test]
async fn refresh_rotates_and_replay_revokes_everything() {
    let fx = fixture();

    let first = fx
        .service
        .login(login_req("alice@co.example", PASSWORD), None, None)
        .await
        .unwrap();

    let second = fx
        .service
        .refresh(&first.refresh_token, None, None)
        .await
        .unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);

    // Exactly one live token after rotation: the new one.
    {
        let records = fx.sessions.records.lock().unwrap();
        let live: Vec<_> = records.iter().filter(|r| r.revoked_at.is_none()).collect();
        assert_eq!(live.len(), 1);
    }

    // Replaying the rotated-out token is treated as compromise.
    let err = fx
        .service
        .refresh(&first.refresh_token, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RefreshReplayDetected));

    let records = fx.sessions.records.lock().unwrap();
    assert!(records.iter().all(|r| r.revoked_at.is_some()));
    assert!(fx
        .audit
        .events
        .lock()
        .unwrap()
        .contains(&"auth.refresh_replay_detected"));
}

#[tokio::test]
async fn logout_revokes_presented_token_only() {
    let fx = fixture();

    let a = fx
        .service
        .login(login_req("alice@co.example", PASSWORD), None, None)
        .await
        .unwrap();
    let b = fx
        .service
        .login(login_req("alice@co.example", PASSWORD), None, None)
        .await
        .unwrap();

    fx.service.logout(&a.refresh_token).await.unwrap();

    let records = fx.sessions.records.lock().unwrap();
    let live: Vec<_> = records.iter().filter(|r| r.revoked_at.is_none()).collect();
    assert_eq!(live.len(), 1);
    drop(records);

    // The surviving session still refreshes.
    fx.service.refresh(&b.refresh_token, None, None).await.unwrap();
}

#[tokio::test]
async fn change_password_enforces_policy_and_revokes_sessions() {
    let fx = fixture();

    let session = fx
        .service
        .login(login_req("alice@co.example", PASSWORD), None, None)
        .await
        .unwrap();

    let principal = Principal {
        user_id: fx.user_id,
        company_id: fx.company_id,
        role: Role::User,
        managed_team_ids: vec![],
    };

    let err = fx
        .service
        .change_password(
            &principal,
            ChangePasswordReq {
                current_password: PASSWORD.to_string(),
                new_password: "short".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WeakPassword(_)));

    fx.service
        .change_password(
            &principal,
            ChangePasswordReq {
                current_password: PASSWORD.to_string(),
                new_password: "N3w!Passw0rd!!!".to_string(),
            },
        )
        .await
        .unwrap();

    // Every refresh token is gone; the old password no longer verifies.
    let records = fx.sessions.records.lock().unwrap();
    assert!(records.iter().all(|r| r.revoked_at.is_some()));
    drop(records);

    let err = fx
        .service
        .refresh(&session.refresh_token, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RefreshReplayDetected));

    let err = fx
        .service
        .login(login_req("alice@co.example", PASSWORD), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredential));

    fx.service
        .login(login_req("alice@co.example", "N3w!Passw0rd!!!"), None, None)
        .await
        .unwrap();
}
