//! Audit trail endpoints (admin only, tenant-scoped).

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared_auth::{authorize, Action, AuthUser, Resource};
use shared_error::AppError;
use uuid::Uuid;
use vacation_service_core::domains::audit::domain::repository::AuditFilter;
use vacation_service_core::domains::audit::dto::AuditEventResp;

use crate::{principal_of, AppState};

#[derive(Debug, Deserialize)]
pub struct AuditQueryParams {
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn list_audit_events(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<Vec<AuditEventResp>>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let scope = authorize(&principal, Action::List, Resource::AuditEvent)?;

    let filter = AuditFilter {
        actor_id: params.actor_id,
        action: params.action,
        entity_type: params.entity_type,
        entity_id: params.entity_id,
        from: params.from,
        to: params.to,
    };

    let events = state
        .audit_sink
        .query(scope.company_id, &filter, params.limit, params.offset)
        .await?;

    Ok(Json(events.iter().map(AuditEventResp::from).collect()))
}

pub async fn get_audit_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<AuditEventResp>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let scope = authorize(&principal, Action::Read, Resource::AuditEvent)?;

    let event = state
        .audit_sink
        .find_by_id(scope.company_id, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("audit event".into()))?;

    Ok(Json(AuditEventResp::from(&event)))
}
