use async_trait::async_trait;
use chrono::NaiveDate;
use shared_auth::ScopePredicate;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;
use vacation_service_core::domains::vacation::domain::{
    model::VacationRequest, repository::RequestRepository,
};
use vacation_service_core::domains::vacation::dto::VacationFilter;

/// PostgreSQL implementation of the read side of the request store.
#[derive(Clone)]
pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_scope(builder: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, scope: &ScopePredicate) {
        builder.push(" AND r.company_id = ");
        builder.push_bind(scope.company_id);
        if let Some(user_id) = scope.user_id {
            builder.push(" AND r.user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(team_ids) = &scope.team_ids {
            builder.push(
                " AND EXISTS (SELECT 1 FROM team_memberships tm WHERE tm.user_id = r.user_id AND tm.left_at IS NULL AND tm.team_id = ANY(",
            );
            builder.push_bind(team_ids.clone());
            builder.push("))");
        }
    }

    fn push_filter(builder: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, filter: &VacationFilter) {
        if let Some(status) = filter.status {
            builder.push(" AND r.status = ");
            builder.push_bind(status);
        }
        if let Some(user_id) = filter.user_id {
            builder.push(" AND r.user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(team_id) = filter.team_id {
            builder.push(" AND r.team_id = ");
            builder.push_bind(team_id);
        }
        if let Some(from) = filter.from {
            builder.push(" AND r.end_date >= ");
            builder.push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND r.start_date <= ");
            builder.push_bind(to);
        }
    }
}

#[async_trait]
impl RequestRepository for PgRequestRepository {
    async fn find_by_id(
        &self,
        company_id: Uuid,
        request_id: Uuid,
    ) -> Result<Option<VacationRequest>, AppError> {
        let request = sqlx::query_as::<_, VacationRequest>(
            "SELECT * FROM vacation_requests WHERE request_id = $1 AND company_id = $2",
        )
        .bind(request_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn list(
        &self,
        scope: &ScopePredicate,
        filter: &VacationFilter,
        page: i32,
        page_size: i32,
    ) -> Result<(Vec<VacationRequest>, i64), AppError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let offset = ((page as i64) - 1) * (page_size as i64);

        let mut query_builder =
            sqlx::QueryBuilder::new("SELECT r.* FROM vacation_requests r WHERE 1=1");
        Self::push_scope(&mut query_builder, scope);
        Self::push_filter(&mut query_builder, filter);
        query_builder.push(" ORDER BY r.created_at DESC LIMIT ");
        query_builder.push_bind(page_size as i64);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let mut count_builder =
            sqlx::QueryBuilder::new("SELECT COUNT(*) FROM vacation_requests r WHERE 1=1");
        Self::push_scope(&mut count_builder, scope);
        Self::push_filter(&mut count_builder, filter);

        let total: (i64,) = count_builder
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let requests = query_builder
            .build_query_as::<VacationRequest>()
            .fetch_all(&self.pool)
            .await?;

        Ok((requests, total.0))
    }

    async fn find_overlapping(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<VacationRequest>, AppError> {
        let requests = sqlx::query_as::<_, VacationRequest>(
            r#"
            SELECT * FROM vacation_requests
            WHERE user_id = $1
              AND status IN ('pending', 'approved')
              AND start_date <= $3
              AND end_date >= $2
              AND ($4::uuid IS NULL OR request_id <> $4)
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn pending_days(&self, user_id: Uuid, period_id: Uuid) -> Result<i32, AppError> {
        let sum: (Option<i64>,) = sqlx::query_as(
            r#"
            SELECT SUM(days_count) FROM vacation_requests
            WHERE user_id = $1 AND period_id = $2 AND status = 'pending'
            "#,
        )
        .bind(user_id)
        .bind(period_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum.0.unwrap_or(0) as i32)
    }
}
