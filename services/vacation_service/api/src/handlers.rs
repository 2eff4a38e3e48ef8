//! Authentication endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde_json::json;
use shared_auth::AuthUser;
use shared_error::AppError;
use shared_rate_limit::{KeyGenerator, RateCategory};
use validator::Validate;
use vacation_service_core::domains::auth::dto::{
    AcceptInviteReq, AuthResp, ChangePasswordReq, LoginReq, PasswordResetConfirmReq,
    PasswordResetRequestReq,
};
use vacation_service_core::domains::identity::dto::UserInfo;

use crate::cookie_helper::{clear_refresh_cookie, read_refresh_cookie, set_refresh_cookie};
use crate::client_context::ClientContext;
use crate::{principal_of, AppState};

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    client: ClientContext,
    Json(payload): Json<LoginReq>,
) -> Result<(HeaderMap, Json<AuthResp>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    // Lockout and the login rate window are enforced inside the service, in
    // that order.
    let session = state
        .auth_service
        .login(payload, client.ip(), client.user_agent())
        .await?;

    let mut headers = HeaderMap::new();
    set_refresh_cookie(&mut headers, &session.refresh_token, session.refresh_expires_at)
        .map_err(AppError::Internal)?;

    Ok((headers, Json(AuthResp::from(&session))))
}

pub async fn refresh(
    State(state): State<AppState>,
    client: ClientContext,
    request_headers: HeaderMap,
) -> Result<(HeaderMap, Json<AuthResp>), AppError> {
    let raw_token = read_refresh_cookie(&request_headers)
        .ok_or_else(|| AppError::NotAuthenticated("missing refresh cookie".into()))?;

    let session = state
        .auth_service
        .refresh(&raw_token, client.ip(), client.user_agent())
        .await?;

    let mut headers = HeaderMap::new();
    set_refresh_cookie(&mut headers, &session.refresh_token, session.refresh_expires_at)
        .map_err(AppError::Internal)?;

    Ok((headers, Json(AuthResp::from(&session))))
}

pub async fn logout(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> Result<(StatusCode, HeaderMap), AppError> {
    if let Some(raw_token) = read_refresh_cookie(&request_headers) {
        state.auth_service.logout(&raw_token).await?;
    }

    let mut headers = HeaderMap::new();
    clear_refresh_cookie(&mut headers).map_err(AppError::Internal)?;

    Ok((StatusCode::NO_CONTENT, headers))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    Json(payload): Json<AcceptInviteReq>,
) -> Result<Json<UserInfo>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let user = state.invite_service.accept_invite(payload).await?;
    Ok(Json(user))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    client: ClientContext,
    Json(payload): Json<PasswordResetRequestReq>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let key = KeyGenerator::email_key("password-reset", &payload.email);
    let gate = state
        .rate_gate
        .check_and_record(RateCategory::PasswordResetRequest, &key)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !gate.allowed {
        return Err(AppError::RateLimited(gate.retry_after));
    }

    state
        .reset_service
        .request_reset(&payload.email, client.ip(), client.user_agent())
        .await?;

    // Uniform answer whether or not the email exists.
    Ok(Json(json!({
        "message": "If the address has an account, a reset token has been sent."
    })))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    client: ClientContext,
    Json(payload): Json<PasswordResetConfirmReq>,
) -> Result<StatusCode, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let gate = state
        .rate_gate
        .check_and_record(
            RateCategory::PasswordResetConfirm,
            &client.rate_key("password-reset-confirm"),
        )
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !gate.allowed {
        return Err(AppError::RateLimited(gate.retry_after));
    }

    state
        .reset_service
        .confirm_reset(&payload.token, &payload.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordReq>,
) -> Result<(StatusCode, HeaderMap), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let principal = principal_of(&state, &auth).await?;
    state
        .auth_service
        .change_password(&principal, payload)
        .await?;

    // Every refresh token is now revoked; drop the cookie as well.
    let mut headers = HeaderMap::new();
    clear_refresh_cookie(&mut headers).map_err(AppError::Internal)?;

    Ok((StatusCode::NO_CONTENT, headers))
}
