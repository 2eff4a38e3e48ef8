//! Vacation export endpoint (CSV).

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use futures::StreamExt;
use serde::Deserialize;
use shared_auth::AuthUser;
use shared_error::AppError;
use shared_rate_limit::RateCategory;
use vacation_service_core::domains::vacation::dto::{ExportFilter, ExportRow};

use crate::{principal_of, AppState};

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(default = "default_format")]
    pub format: String,
    pub status: Option<vacation_service_core::domains::vacation::domain::model::RequestStatus>,
    pub user_id: Option<uuid::Uuid>,
    pub team_id: Option<uuid::Uuid>,
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
}

impl ExportParams {
    fn filter(&self) -> ExportFilter {
        ExportFilter {
            status: self.status,
            user_id: self.user_id,
            team_id: self.team_id,
            from: self.from,
            to: self.to,
        }
    }
}

fn default_format() -> String {
    "csv".to_string()
}

pub const CSV_HEADER: &str =
    "request_id,employee_email,employee_name,team_code,start_date,end_date,type,status,days_count,approved_at\n";

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn row_to_csv(row: &ExportRow) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{}\n",
        row.request_id,
        csv_escape(&row.employee_email),
        csv_escape(&row.employee_name),
        csv_escape(row.team_code.as_deref().unwrap_or("")),
        row.start_date,
        row.end_date,
        serde_json::to_value(row.vacation_type)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default(),
        serde_json::to_value(row.status)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default(),
        row.days_count,
        row.approved_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
    )
}

pub async fn export_vacations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    // XLSX serialization lives outside this core.
    if params.format != "csv" {
        return Err(AppError::InvalidInput(format!(
            "unsupported export format: {}",
            params.format
        )));
    }

    let principal = principal_of(&state, &auth).await?;

    let gate = state
        .rate_gate
        .check_and_record(RateCategory::Export, &principal.user_id.to_string())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !gate.allowed {
        return Err(AppError::RateLimited(gate.retry_after));
    }

    let rows = state
        .export_service
        .export_rows(&principal, params.filter())
        .await?;

    let header_stream = futures::stream::once(async {
        Ok::<_, std::io::Error>(axum::body::Bytes::from_static(CSV_HEADER.as_bytes()))
    });
    let body_stream = rows.map(|row| match row {
        Ok(row) => Ok(axum::body::Bytes::from(row_to_csv(&row))),
        Err(e) => {
            tracing::error!("Export stream aborted: {}", e);
            Err(std::io::Error::other("export failed"))
        },
    });

    let body = Body::from_stream(header_stream.chain(body_stream));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"))
        .header(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"vacations.csv\""),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build export response: {}", e)))?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;
    use vacation_service_core::domains::vacation::domain::model::{RequestStatus, VacationType};

    #[test]
    fn csv_rows_escape_commas_and_quotes() {
        let row = ExportRow {
            request_id: Uuid::nil(),
            employee_email: "a@co.example".into(),
            employee_name: "Doe, Jane \"JD\"".into(),
            team_code: None,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 18).unwrap(),
            vacation_type: VacationType::Annual,
            status: RequestStatus::Approved,
            days_count: 5,
            approved_at: None,
        };

        let line = row_to_csv(&row);
        assert!(line.contains("\"Doe, Jane \"\"JD\"\"\""));
        assert!(line.contains("annual"));
        assert!(line.contains("approved"));
        assert!(line.ends_with('\n'));
    }
}
