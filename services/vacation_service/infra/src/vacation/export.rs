//! Export projector: streams scoped request rows as flat records.
//!
//! The stream is forward-only and restartable: it pages through the result
//! set by keyset on `request_id` (UUIDv7, so time-ordered), fetching one
//! batch at a time. Serialization to CSV/XLSX happens at the HTTP layer.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use shared_auth::{authorize, Action, Principal, Resource, ScopePredicate};
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;
use vacation_service_core::domains::vacation::domain::service::ExportService;
use vacation_service_core::domains::vacation::dto::{ExportFilter, ExportRow};

const BATCH_SIZE: i64 = 500;

#[derive(Clone)]
pub struct PgExportService {
    pool: PgPool,
}

impl PgExportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_batch(
        pool: &PgPool,
        scope: &ScopePredicate,
        filter: &ExportFilter,
        after: Option<Uuid>,
    ) -> Result<Vec<ExportRow>, AppError> {
        let mut builder = sqlx::QueryBuilder::new(
            r#"
            SELECT r.request_id,
                   u.email AS employee_email,
                   u.first_name || ' ' || u.last_name AS employee_name,
                   t.code AS team_code,
                   r.start_date, r.end_date, r.vacation_type, r.status,
                   r.days_count, r.approved_at
            FROM vacation_requests r
            JOIN users u ON u.user_id = r.user_id
            LEFT JOIN teams t ON t.team_id = r.team_id
            WHERE r.company_id = "#,
        );
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

        match filter.status {
            Some(status) => {
                builder.push(" AND r.status = ");
                builder.push_bind(status);
            },
            None => {
                // Exports cover decided-or-deciding requests by default.
                builder.push(" AND r.status IN ('pending', 'approved')");
            },
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
        if let Some(after) = after {
            builder.push(" AND r.request_id > ");
            builder.push_bind(after);
        }

        builder.push(" ORDER BY r.request_id LIMIT ");
        builder.push_bind(BATCH_SIZE);

        let rows = builder
            .build_query_as::<ExportRow>()
            .fetch_all(pool)
            .await?;

        Ok(rows)
    }
}

#[async_trait]
impl ExportService for PgExportService {
    async fn export_rows(
        &self,
        principal: &Principal,
        filter: ExportFilter,
    ) -> Result<BoxStream<'static, Result<ExportRow, AppError>>, AppError> {
        let scope = authorize(principal, Action::List, Resource::VacationRequest)?;
        let pool = self.pool.clone();

        struct PageState {
            pool: PgPool,
            scope: ScopePredicate,
            filter: ExportFilter,
            after: Option<Uuid>,
            done: bool,
        }

        let state = PageState {
            pool,
            scope,
            filter,
            after: None,
            done: false,
        };

        let stream = stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }
            match Self::fetch_batch(&state.pool, &state.scope, &state.filter, state.after).await {
                Ok(batch) => {
                    if batch.len() < BATCH_SIZE as usize {
                        state.done = true;
                    }
                    if let Some(last) = batch.last() {
                        state.after = Some(last.request_id);
                    } else {
                        return None;
                    }
                    let items: Vec<Result<ExportRow, AppError>> =
                        batch.into_iter().map(Ok).collect();
                    Some((stream::iter(items), state))
                },
                Err(e) => {
                    state.done = true;
                    Some((stream::iter(vec![Err(e)]), state))
                },
            }
        })
        .flatten()
        .boxed();

        Ok(stream)
    }
}
