use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::domain::model::AuditEvent;

#[derive(Debug, Serialize)]
pub struct AuditEventResp {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&AuditEvent> for AuditEventResp {
    fn from(event: &AuditEvent) -> Self {
        Self {
            id: event.event_id,
            actor_id: event.actor_id,
            action: event.action.clone(),
            entity_type: event.entity_type.clone(),
            entity_id: event.entity_id,
            before: event.before.as_ref().map(|j| j.0.clone()),
            after: event.after.as_ref().map(|j| j.0.clone()),
            ip_address: event.ip_address.clone(),
            created_at: event.created_at,
        }
    }
}
