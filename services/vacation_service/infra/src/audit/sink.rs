//! PostgreSQL-backed append-only audit sink.
//!
//! Events describing a state change are written through [`record_in`] on the
//! same connection as the change, inside its transaction: if the operation
//! aborts, the audit row vanishes with it. Denials and other standalone
//! events go through the detached [`AuditSink::record`]. There is no update
//! or delete path; the schema backs this with a guard trigger.

use async_trait::async_trait;
use chrono::Utc;
use shared_error::AppError;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use vacation_service_core::domains::audit::domain::{
    model::{AuditEvent, NewAuditEvent},
    repository::{AuditFilter, AuditSink},
};

#[derive(Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an event on an existing connection (transaction-participating).
    pub async fn record_in(
        conn: &mut PgConnection,
        event: NewAuditEvent,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_events (
                event_id, company_id, actor_id, action, entity_type, entity_id,
                before, after, ip_address, user_agent, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(event.company_id)
        .bind(event.actor_id)
        .bind(event.action)
        .bind(event.entity_type)
        .bind(event.entity_id)
        .bind(event.before.map(sqlx::types::Json))
        .bind(event.after.map(sqlx::types::Json))
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, event: NewAuditEvent) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::record_in(&mut conn, event).await
    }

    async fn query(
        &self,
        company_id: Uuid,
        filter: &AuditFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditEvent>, AppError> {
        let mut builder =
            sqlx::QueryBuilder::new("SELECT * FROM audit_events WHERE company_id = ");
        builder.push_bind(company_id);

        if let Some(actor_id) = filter.actor_id {
            builder.push(" AND actor_id = ");
            builder.push_bind(actor_id);
        }
        if let Some(action) = &filter.action {
            builder.push(" AND action = ");
            builder.push_bind(action);
        }
        if let Some(entity_type) = &filter.entity_type {
            builder.push(" AND entity_type = ");
            builder.push_bind(entity_type);
        }
        if let Some(entity_id) = filter.entity_id {
            builder.push(" AND entity_id = ");
            builder.push_bind(entity_id);
        }
        if let Some(from) = filter.from {
            builder.push(" AND created_at >= ");
            builder.push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND created_at <= ");
            builder.push_bind(to);
        }

        builder.push(" ORDER BY created_at DESC, event_id DESC LIMIT ");
        builder.push_bind(limit.clamp(1, 500));
        builder.push(" OFFSET ");
        builder.push_bind(offset.max(0));

        let events = builder
            .build_query_as::<AuditEvent>()
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn find_by_id(
        &self,
        company_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<AuditEvent>, AppError> {
        let event = sqlx::query_as::<_, AuditEvent>(
            "SELECT * FROM audit_events WHERE event_id = $1 AND company_id = $2",
        )
        .bind(event_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }
}
