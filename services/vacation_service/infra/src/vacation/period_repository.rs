use async_trait::async_trait;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;
use vacation_service_core::domains::vacation::domain::{
    model::VacationPeriod, repository::PeriodRepository,
};

/// PostgreSQL implementation of PeriodRepository
#[derive(Clone)]
pub struct PgPeriodRepository {
    pool: PgPool,
}

impl PgPeriodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PeriodRepository for PgPeriodRepository {
    async fn list_active(&self, company_id: Uuid) -> Result<Vec<VacationPeriod>, AppError> {
        let periods = sqlx::query_as::<_, VacationPeriod>(
            "SELECT * FROM vacation_periods WHERE company_id = $1 AND is_active ORDER BY start_date",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    async fn find_by_id(
        &self,
        company_id: Uuid,
        period_id: Uuid,
    ) -> Result<Option<VacationPeriod>, AppError> {
        let period = sqlx::query_as::<_, VacationPeriod>(
            "SELECT * FROM vacation_periods WHERE period_id = $1 AND company_id = $2",
        )
        .bind(period_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }

    async fn create(&self, period: &VacationPeriod) -> Result<VacationPeriod, AppError> {
        let period = sqlx::query_as::<_, VacationPeriod>(
            r#"
            INSERT INTO vacation_periods (
                period_id, company_id, name, start_date, end_date,
                is_default, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(period.period_id)
        .bind(period.company_id)
        .bind(&period.name)
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(period.is_default)
        .bind(period.is_active)
        .bind(period.created_at)
        .bind(period.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(period)
    }

    async fn has_default(&self, company_id: Uuid) -> Result<bool, AppError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vacation_periods WHERE company_id = $1 AND is_default)",
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }
}
