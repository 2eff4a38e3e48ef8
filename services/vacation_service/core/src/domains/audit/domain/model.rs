use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Action codes recorded in the audit trail. Stable strings; the set grows
/// but entries never change meaning.
pub mod actions {
    pub const LOGIN: &str = "auth.login";
    pub const LOGIN_FAILED: &str = "auth.login_failed";
    pub const LOGOUT: &str = "auth.logout";
    pub const TOKEN_REFRESHED: &str = "auth.token_refreshed";
    pub const REFRESH_REPLAY: &str = "auth.refresh_replay_detected";
    pub const PASSWORD_CHANGED: &str = "auth.password_changed";
    pub const PASSWORD_RESET_REQUESTED: &str = "auth.password_reset_requested";
    pub const PASSWORD_RESET_COMPLETED: &str = "auth.password_reset_completed";
    pub const INVITE_CREATED: &str = "invite.created";
    pub const INVITE_ACCEPTED: &str = "invite.accepted";
    pub const INVITE_REVOKED: &str = "invite.revoked";
    pub const USER_UPDATED: &str = "user.updated";
    pub const USER_ROLE_CHANGED: &str = "user.role_changed";
    pub const USER_DELETED: &str = "user.deleted";
    pub const REQUEST_CREATED: &str = "vacation.request_created";
    pub const REQUEST_SUBMITTED: &str = "vacation.request_submitted";
    pub const REQUEST_APPROVED: &str = "vacation.request_approved";
    pub const REQUEST_REJECTED: &str = "vacation.request_rejected";
    pub const REQUEST_CANCELLED: &str = "vacation.request_cancelled";
    pub const REQUEST_WITHDRAWN: &str = "vacation.request_withdrawn";
    pub const AUTHZ_DENIED: &str = "authz.denied";
    pub const CROSS_TENANT_DENIED: &str = "authz.cross_tenant_denied";
}

/// Immutable audit event. Rows are inserted, never updated or deleted.
#[derive(Debug, Clone, FromRow)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub company_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub before: Option<sqlx::types::Json<serde_json::Value>>,
    pub after: Option<sqlx::types::Json<serde_json::Value>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Event payload prior to insertion.
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub company_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Option<Uuid>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditEvent {
    pub fn new(company_id: Uuid, action: &'static str, entity_type: &'static str) -> Self {
        Self {
            company_id,
            actor_id: None,
            action,
            entity_type,
            entity_id: None,
            before: None,
            after: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn entity(mut self, entity_id: Uuid) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn before(mut self, snapshot: serde_json::Value) -> Self {
        self.before = Some(snapshot);
        self
    }

    pub fn after(mut self, snapshot: serde_json::Value) -> Self {
        self.after = Some(snapshot);
        self
    }

    pub fn client(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip;
        self.user_agent = user_agent;
        self
    }
}
