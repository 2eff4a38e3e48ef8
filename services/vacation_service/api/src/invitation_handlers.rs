//! Admin invitation endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared_auth::AuthUser;
use shared_error::AppError;
use uuid::Uuid;
use validator::Validate;
use vacation_service_core::domains::auth::dto::{CreateInviteReq, InviteResp};

use crate::{principal_of, AppState};

#[derive(Debug, Deserialize)]
pub struct InviteListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn create_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateInviteReq>,
) -> Result<(StatusCode, Json<InviteResp>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let principal = principal_of(&state, &auth).await?;
    let invite = state.invite_service.create_invite(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

pub async fn list_invites(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<InviteListParams>,
) -> Result<Json<Vec<InviteResp>>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let invites = state
        .invite_service
        .list_invites(&principal, params.limit.clamp(1, 200), params.offset.max(0))
        .await?;
    Ok(Json(invites))
}

pub async fn revoke_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let principal = principal_of(&state, &auth).await?;
    state
        .invite_service
        .revoke_invite(&principal, invite_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn resend_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<Json<InviteResp>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let invite = state
        .invite_service
        .resend_invite(&principal, invite_id)
        .await?;
    Ok(Json(invite))
}
