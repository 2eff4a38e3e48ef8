use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use uuid::Uuid;

use super::model::{AuditEvent, NewAuditEvent};

/// Query filter for the audit trail. All criteria are ANDed; the company is
/// mandatory — audit reads are tenant-scoped even for admins.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Append-only event sink.
///
/// `record` writes outside any transaction and is for events with no
/// surrounding state change (denials, failed logins). State-changing
/// operations write their audit row inside their own transaction so the
/// record exists iff the change committed; that path lives with the engine,
/// not behind this trait.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: NewAuditEvent) -> Result<(), AppError>;

    /// Events matching the filter, created_at descending, id tiebreak.
    async fn query(
        &self,
        company_id: Uuid,
        filter: &AuditFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditEvent>, AppError>;

    async fn find_by_id(
        &self,
        company_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<AuditEvent>, AppError>;
}
