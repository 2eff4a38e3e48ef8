use async_trait::async_trait;
use chrono::NaiveDate;
use shared_auth::ScopePredicate;
use shared_error::AppError;
use uuid::Uuid;

use super::model::{VacationAllocation, VacationPeriod, VacationRequest};
use crate::domains::vacation::dto::VacationFilter;

/// Vacation-period reads. Mutation beyond on-demand default materialization
/// is administrative seeding, outside the request path.
#[async_trait]
pub trait PeriodRepository: Send + Sync {
    async fn list_active(&self, company_id: Uuid) -> Result<Vec<VacationPeriod>, AppError>;

    async fn find_by_id(
        &self,
        company_id: Uuid,
        period_id: Uuid,
    ) -> Result<Option<VacationPeriod>, AppError>;

    async fn create(&self, period: &VacationPeriod) -> Result<VacationPeriod, AppError>;

    async fn has_default(&self, company_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AllocationRepository: Send + Sync {
    async fn find(
        &self,
        user_id: Uuid,
        period_id: Uuid,
    ) -> Result<Option<VacationAllocation>, AppError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VacationAllocation>, AppError>;

    async fn create(&self, allocation: &VacationAllocation)
        -> Result<VacationAllocation, AppError>;
}

/// Read side of the request store. State transitions go through the request
/// engine, which owns its transactions and row locks.
#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn find_by_id(
        &self,
        company_id: Uuid,
        request_id: Uuid,
    ) -> Result<Option<VacationRequest>, AppError>;

    /// List requests visible under `scope`, filtered and paginated,
    /// newest first.
    async fn list(
        &self,
        scope: &ScopePredicate,
        filter: &VacationFilter,
        page: i32,
        page_size: i32,
    ) -> Result<(Vec<VacationRequest>, i64), AppError>;

    /// The user's requests in the overlap set (pending or approved)
    /// intersecting [start, end], excluding `exclude_id` if given.
    async fn find_overlapping(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<VacationRequest>, AppError>;

    /// Sum of `days_count` over the user's pending requests in a period.
    async fn pending_days(&self, user_id: Uuid, period_id: Uuid) -> Result<i32, AppError>;
}
