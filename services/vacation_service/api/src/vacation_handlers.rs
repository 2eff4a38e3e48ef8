//! Vacation request endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared_auth::{AuthUser, Principal};
use shared_error::AppError;
use shared_rate_limit::RateCategory;
use shared_types::PageParams;
use uuid::Uuid;
use validator::Validate;
use vacation_service_core::domains::vacation::dto::{
    ApproveReq, BalanceResp, CreateVacationReq, ModifyVacationReq, RejectReq, VacationFilter,
    VacationListResp, VacationResp,
};

use crate::{principal_of, AppState};

async fn gate(
    state: &AppState,
    category: RateCategory,
    principal: &Principal,
) -> Result<(), AppError> {
    let result = state
        .rate_gate
        .check_and_record(category, &principal.user_id.to_string())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !result.allowed {
        return Err(AppError::RateLimited(result.retry_after));
    }
    Ok(())
}

pub async fn list_vacations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageParams>,
    Query(filter): Query<VacationFilter>,
) -> Result<Json<VacationListResp>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    gate(&state, RateCategory::VacationRead, &principal).await?;

    let (page, page_size, _) = page.clamped();
    let requests = state
        .vacation_service
        .list_requests(&principal, filter, page, page_size)
        .await?;
    Ok(Json(requests))
}

pub async fn create_vacation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateVacationReq>,
) -> Result<(StatusCode, Json<VacationResp>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let principal = principal_of(&state, &auth).await?;
    gate(&state, RateCategory::VacationWrite, &principal).await?;

    let request = state
        .vacation_service
        .create_request(&principal, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn get_vacation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<VacationResp>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    gate(&state, RateCategory::VacationRead, &principal).await?;

    let request = state
        .vacation_service
        .get_request(&principal, request_id)
        .await?;
    Ok(Json(request))
}

pub async fn modify_vacation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ModifyVacationReq>,
) -> Result<Json<VacationResp>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let principal = principal_of(&state, &auth).await?;
    gate(&state, RateCategory::VacationWrite, &principal).await?;

    let request = state
        .vacation_service
        .modify_request(&principal, request_id, payload)
        .await?;
    Ok(Json(request))
}

pub async fn submit_vacation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<VacationResp>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    gate(&state, RateCategory::VacationWrite, &principal).await?;

    let request = state
        .vacation_service
        .submit_request(&principal, request_id)
        .await?;
    Ok(Json(request))
}

pub async fn approve_vacation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ApproveReq>,
) -> Result<Json<VacationResp>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let principal = principal_of(&state, &auth).await?;
    gate(&state, RateCategory::VacationWrite, &principal).await?;

    let request = state
        .vacation_service
        .approve_request(&principal, request_id, payload)
        .await?;
    Ok(Json(request))
}

pub async fn reject_vacation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RejectReq>,
) -> Result<Json<VacationResp>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let principal = principal_of(&state, &auth).await?;
    gate(&state, RateCategory::VacationWrite, &principal).await?;

    let request = state
        .vacation_service
        .reject_request(&principal, request_id, payload)
        .await?;
    Ok(Json(request))
}

pub async fn cancel_vacation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<VacationResp>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    gate(&state, RateCategory::VacationWrite, &principal).await?;

    let request = state
        .vacation_service
        .cancel_request(&principal, request_id)
        .await?;
    Ok(Json(request))
}

pub async fn balance(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<BalanceResp>>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    gate(&state, RateCategory::VacationRead, &principal).await?;

    let balances = state.vacation_service.balance(&principal).await?;
    Ok(Json(balances))
}
