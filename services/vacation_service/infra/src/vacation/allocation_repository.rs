use async_trait::async_trait;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;
use vacation_service_core::domains::vacation::domain::{
    model::VacationAllocation, repository::AllocationRepository,
};

/// PostgreSQL implementation of AllocationRepository
#[derive(Clone)]
pub struct PgAllocationRepository {
    pool: PgPool,
}

impl PgAllocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AllocationRepository for PgAllocationRepository {
    async fn find(
        &self,
        user_id: Uuid,
        period_id: Uuid,
    ) -> Result<Option<VacationAllocation>, AppError> {
        let allocation = sqlx::query_as::<_, VacationAllocation>(
            "SELECT * FROM vacation_allocations WHERE user_id = $1 AND period_id = $2",
        )
        .bind(user_id)
        .bind(period_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(allocation)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VacationAllocation>, AppError> {
        let allocations = sqlx::query_as::<_, VacationAllocation>(
            "SELECT * FROM vacation_allocations WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(allocations)
    }

    async fn create(
        &self,
        allocation: &VacationAllocation,
    ) -> Result<VacationAllocation, AppError> {
        let allocation = sqlx::query_as::<_, VacationAllocation>(
            r#"
            INSERT INTO vacation_allocations (
                allocation_id, company_id, user_id, period_id,
                total_days, carried_over_days, days_used, notes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(allocation.allocation_id)
        .bind(allocation.company_id)
        .bind(allocation.user_id)
        .bind(allocation.period_id)
        .bind(allocation.total_days)
        .bind(allocation.carried_over_days)
        .bind(allocation.days_used)
        .bind(&allocation.notes)
        .bind(allocation.created_at)
        .bind(allocation.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(allocation)
    }
}
