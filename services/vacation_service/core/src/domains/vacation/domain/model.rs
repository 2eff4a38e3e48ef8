use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vacation request lifecycle states.
///
/// Terminal states are `Approved`, `Rejected`, `Cancelled`, `Withdrawn`;
/// the only transition out of `Approved` is withdrawal before start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Withdrawn,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Rejected | RequestStatus::Cancelled | RequestStatus::Withdrawn
        )
    }

    /// States that participate in the overlap set (I4): a day already
    /// claimed by a pending or approved request cannot be claimed again.
    /// Drafts are excluded.
    pub fn blocks_overlap(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Approved)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestStatus::Draft => "draft",
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Withdrawn => "withdrawn",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VacationType {
    Annual,
    Sick,
    Personal,
    Unpaid,
    Other,
}

/// Company-configurable accounting window (commonly April 1 – March 31).
/// At most one period per company is the default.
#[derive(Debug, Clone, FromRow)]
pub struct VacationPeriod {
    pub period_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VacationPeriod {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Per-(user, period) day accounting. `days_used` tracks the sum of
/// `days_count` over the user's approved requests in the period (I3);
/// it changes only through request-engine transitions.
#[derive(Debug, Clone, FromRow)]
pub struct VacationAllocation {
    pub allocation_id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub period_id: Uuid,
    pub total_days: i32,
    pub carried_over_days: i32,
    pub days_used: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VacationAllocation {
    pub fn total_available(&self) -> i32 {
        self.total_days + self.carried_over_days
    }

    pub fn remaining(&self) -> i32 {
        self.total_available() - self.days_used
    }
}

/// A vacation request. `period_id` and `days_count` are resolved at
/// submission time and frozen thereafter.
#[derive(Debug, Clone, FromRow)]
pub struct VacationRequest {
    pub request_id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub vacation_type: VacationType,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub approver_id: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_reason: Option<String>,
    pub period_id: Option<Uuid>,
    pub days_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inclusive date-range overlap.
pub fn dates_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn overlap_is_inclusive() {
        // Shared single day counts as overlap.
        assert!(dates_overlap(
            d(2025, 7, 14),
            d(2025, 7, 18),
            d(2025, 7, 18),
            d(2025, 7, 20)
        ));
        // Disjoint ranges do not.
        assert!(!dates_overlap(
            d(2025, 7, 14),
            d(2025, 7, 18),
            d(2025, 7, 19),
            d(2025, 7, 20)
        ));
        // Containment overlaps.
        assert!(dates_overlap(
            d(2025, 7, 16),
            d(2025, 7, 17),
            d(2025, 7, 14),
            d(2025, 7, 18)
        ));
    }

    #[test]
    fn terminal_and_overlap_sets() {
        assert!(!RequestStatus::Draft.blocks_overlap());
        assert!(RequestStatus::Pending.blocks_overlap());
        assert!(RequestStatus::Approved.blocks_overlap());
        assert!(!RequestStatus::Cancelled.blocks_overlap());

        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Draft.is_terminal());
        assert!(!RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Withdrawn.is_terminal());
    }

    #[test]
    fn allocation_arithmetic() {
        let allocation = VacationAllocation {
            allocation_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            period_id: Uuid::new_v4(),
            total_days: 25,
            carried_over_days: 3,
            days_used: 5,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(allocation.total_available(), 28);
        assert_eq!(allocation.remaining(), 23);
    }
}
