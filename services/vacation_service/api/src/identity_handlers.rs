//! Identity and org-chart endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared_auth::AuthUser;
use shared_error::AppError;
use shared_types::PageParams;
use uuid::Uuid;
use validator::Validate;
use vacation_service_core::domains::identity::dto::{
    CompanyResp, FunctionResp, TeamResp, UpdateUserReq, UserFilter, UserInfo, UserListResp,
};

use crate::{principal_of, AppState};

pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserInfo>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let user = state.identity_service.me(&principal).await?;
    Ok(Json(user))
}

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageParams>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<UserListResp>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let (page, page_size, _) = page.clamped();
    let users = state
        .identity_service
        .list_users(&principal, filter, page, page_size)
        .await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserInfo>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let user = state.identity_service.get_user(&principal, user_id).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserReq>,
) -> Result<Json<UserInfo>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let principal = principal_of(&state, &auth).await?;
    let user = state
        .identity_service
        .update_user(&principal, user_id, payload)
        .await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let principal = principal_of(&state, &auth).await?;
    state
        .identity_service
        .soft_delete_user(&principal, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CompanyResp>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let company = state
        .identity_service
        .get_company(&principal, company_id)
        .await?;
    Ok(Json(company))
}

pub async fn list_functions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<FunctionResp>>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let functions = state
        .identity_service
        .list_functions(&principal, company_id)
        .await?;
    Ok(Json(functions))
}

pub async fn list_teams(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<TeamResp>>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let teams = state
        .identity_service
        .list_teams(&principal, company_id)
        .await?;
    Ok(Json(teams))
}

pub async fn get_team(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamResp>, AppError> {
    let principal = principal_of(&state, &auth).await?;
    let team = state.identity_service.get_team(&principal, team_id).await?;
    Ok(Json(team))
}
