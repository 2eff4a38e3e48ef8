use async_trait::async_trait;
use futures::stream::BoxStream;
use shared_auth::Principal;
use shared_error::AppError;
use uuid::Uuid;

use crate::domains::vacation::dto::{
    ApproveReq, BalanceResp, CreateVacationReq, ExportFilter, ExportRow, ModifyVacationReq,
    RejectReq, VacationFilter, VacationListResp, VacationResp,
};

/// Vacation request lifecycle. Every state transition validates the
/// pre-state under a row lock and commits the post-state, allocation
/// movement, and audit record in one transaction.
#[async_trait]
pub trait VacationService: Send + Sync {
    /// Validate dates, resolve the period for the start date, compute the
    /// business-day count, check overlap, and create the request in
    /// `pending` (or `draft` when asked).
    async fn create_request(
        &self,
        principal: &Principal,
        req: CreateVacationReq,
    ) -> Result<VacationResp, AppError>;

    async fn get_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> Result<VacationResp, AppError>;

    async fn list_requests(
        &self,
        principal: &Principal,
        filter: VacationFilter,
        page: i32,
        page_size: i32,
    ) -> Result<VacationListResp, AppError>;

    /// Re-validate and update; drafts only.
    async fn modify_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
        req: ModifyVacationReq,
    ) -> Result<VacationResp, AppError>;

    /// Move a draft to pending, resolving period and days at this point.
    async fn submit_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> Result<VacationResp, AppError>;

    /// Approve a pending request: requires a manager of the owner's team or
    /// an admin, never the owner; debits the allocation.
    async fn approve_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
        req: ApproveReq,
    ) -> Result<VacationResp, AppError>;

    async fn reject_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
        req: RejectReq,
    ) -> Result<VacationResp, AppError>;

    /// Owner (any non-terminal state) or admin/manager-of-team. Cancelling
    /// an approved request credits the allocation back; after the start
    /// date the owner can no longer withdraw.
    async fn cancel_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> Result<VacationResp, AppError>;

    /// Balance projection across the caller's allocations.
    async fn balance(&self, principal: &Principal) -> Result<Vec<BalanceResp>, AppError>;
}

/// Streams approved/pending rows intersected with the caller's scope into a
/// forward-only sequence of flat records.
#[async_trait]
pub trait ExportService: Send + Sync {
    async fn export_rows(
        &self,
        principal: &Principal,
        filter: ExportFilter,
    ) -> Result<BoxStream<'static, Result<ExportRow, AppError>>, AppError>;
}
