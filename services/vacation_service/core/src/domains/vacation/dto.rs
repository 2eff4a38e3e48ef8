use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::domain::model::{RequestStatus, VacationPeriod, VacationRequest, VacationType};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVacationReq {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "type")]
    pub vacation_type: VacationType,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
    pub team_id: Option<Uuid>,
    /// Land in draft instead of submitting directly.
    #[serde(default)]
    pub draft: bool,
}

/// Modification payload; allowed only while the request is a draft.
#[derive(Debug, Deserialize, Validate)]
pub struct ModifyVacationReq {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "type")]
    pub vacation_type: VacationType,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VacationFilter {
    pub status: Option<RequestStatus>,
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApproveReq {
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectReq {
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VacationResp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "type")]
    pub vacation_type: VacationType,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub approver_id: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_reason: Option<String>,
    pub period_id: Option<Uuid>,
    pub days_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&VacationRequest> for VacationResp {
    fn from(request: &VacationRequest) -> Self {
        Self {
            id: request.request_id,
            user_id: request.user_id,
            team_id: request.team_id,
            start_date: request.start_date,
            end_date: request.end_date,
            vacation_type: request.vacation_type,
            status: request.status,
            reason: request.reason.clone(),
            approver_id: request.approver_id,
            approved_at: request.approved_at,
            rejected_reason: request.rejected_reason.clone(),
            period_id: request.period_id,
            days_count: request.days_count,
            created_at: request.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VacationListResp {
    pub requests: Vec<VacationResp>,
    pub total: i64,
    pub page: i32,
    pub page_size: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodResp {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_default: bool,
}

impl From<&VacationPeriod> for PeriodResp {
    fn from(period: &VacationPeriod) -> Self {
        Self {
            id: period.period_id,
            name: period.name.clone(),
            start_date: period.start_date,
            end_date: period.end_date,
            is_default: period.is_default,
        }
    }
}

/// Balance projection for one (user, period) allocation. Read-only; the
/// numbers move only through request-engine transitions.
#[derive(Debug, Serialize)]
pub struct BalanceResp {
    pub period: PeriodResp,
    pub total_days: i32,
    pub carried_over_days: i32,
    pub days_used: i32,
    pub pending_days: i32,
    pub remaining: i32,
}

/// Flat projection record suitable for CSV/XLSX serialization.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExportRow {
    pub request_id: Uuid,
    pub employee_email: String,
    pub employee_name: String,
    pub team_code: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub vacation_type: VacationType,
    pub status: RequestStatus,
    pub days_count: i32,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportFilter {
    pub status: Option<RequestStatus>,
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
