//! The vacation request engine.
//!
//! Every state transition reads the current row under `SELECT ... FOR
//! UPDATE`, validates the pre-state, and writes the post-state together with
//! any allocation movement and the audit record in one transaction. A second
//! approver racing on the same pending request observes the committed status
//! and fails with `NotPending`.

use async_trait::async_trait;
use chrono::NaiveDate;
use shared_auth::{authorize, Action, Principal, Resource, Role, ScopePredicate};
use shared_error::AppError;
use shared_types::SharedClock;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use vacation_service_core::domains::audit::domain::{
    model::{actions, NewAuditEvent},
    repository::AuditSink,
};
use vacation_service_core::domains::identity::domain::{
    model::Company,
    repository::{CompanyRepository, MembershipRepository},
};
use vacation_service_core::domains::vacation::calendar::{
    business_days, default_period_bounds, default_period_name, resolve_period,
};
use vacation_service_core::domains::vacation::domain::{
    model::{RequestStatus, VacationAllocation, VacationPeriod, VacationRequest},
    repository::{AllocationRepository, PeriodRepository, RequestRepository},
    service::VacationService,
};
use vacation_service_core::domains::vacation::dto::{
    ApproveReq, BalanceResp, CreateVacationReq, ModifyVacationReq, PeriodResp, RejectReq,
    VacationFilter, VacationListResp, VacationResp,
};

use crate::audit::PgAuditSink;
use crate::identity::{PgCompanyRepository, PgMembershipRepository};
use crate::vacation::{PgAllocationRepository, PgPeriodRepository, PgRequestRepository};

pub struct PgVacationService {
    pool: PgPool,
    request_repo: PgRequestRepository,
    period_repo: PgPeriodRepository,
    allocation_repo: PgAllocationRepository,
    membership_repo: PgMembershipRepository,
    company_repo: PgCompanyRepository,
    audit: PgAuditSink,
    clock: SharedClock,
}

impl PgVacationService {
    pub fn new(pool: PgPool, audit: PgAuditSink, clock: SharedClock) -> Self {
        Self {
            request_repo: PgRequestRepository::new(pool.clone()),
            period_repo: PgPeriodRepository::new(pool.clone()),
            allocation_repo: PgAllocationRepository::new(pool.clone()),
            membership_repo: PgMembershipRepository::new(pool.clone()),
            company_repo: PgCompanyRepository::new(pool.clone()),
            audit,
            clock,
            pool,
        }
    }

    fn validate_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
        if start > end {
            return Err(AppError::InvalidInput(
                "start date must not be after end date".into(),
            ));
        }
        let today = self.clock.now().date_naive();
        if start < today {
            return Err(AppError::DateInPast);
        }
        Ok(())
    }

    /// Fetch the row by id alone and enforce the tenant boundary. Foreign
    /// rows answer not-found, and the denial is audited.
    async fn fetch_checked(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> Result<VacationRequest, AppError> {
        let request = sqlx::query_as::<_, VacationRequest>(
            "SELECT * FROM vacation_requests WHERE request_id = $1",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("vacation request".into()))?;

        if request.company_id != principal.company_id {
            self.audit
                .record(
                    NewAuditEvent::new(
                        principal.company_id,
                        actions::CROSS_TENANT_DENIED,
                        "vacation_request",
                    )
                    .actor(principal.user_id)
                    .entity(request_id),
                )
                .await?;
            return Err(AppError::CrossTenantAccess);
        }

        Ok(request)
    }

    /// Read check after fetch: self scope requires ownership, team scope an
    /// active membership intersection.
    async fn check_request_in_scope(
        &self,
        request: &VacationRequest,
        scope: &ScopePredicate,
    ) -> Result<(), AppError> {
        if let Some(user_id) = scope.user_id {
            if request.user_id != user_id {
                return Err(AppError::NotAuthorized("outside your scope".into()));
            }
        }
        if let Some(team_ids) = &scope.team_ids {
            if !self
                .membership_repo
                .user_in_teams(request.user_id, team_ids)
                .await?
            {
                return Err(AppError::NotAuthorized(
                    "requester is not on a managed team".into(),
                ));
            }
        }
        Ok(())
    }

    async fn company(&self, company_id: Uuid) -> Result<Company, AppError> {
        self.company_repo
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("company".into()))
    }

    /// Serialize overlapping submissions per user. Row locks cannot exclude
    /// a concurrent insert of a new overlapping row, so submissions take a
    /// per-user advisory lock for the transaction.
    async fn lock_user_requests(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(user_id.to_string())
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn check_overlap_in(
        conn: &mut PgConnection,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let conflict: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT request_id FROM vacation_requests
            WHERE user_id = $1
              AND status IN ('pending', 'approved')
              AND start_date <= $3
              AND end_date >= $2
              AND ($4::uuid IS NULL OR request_id <> $4)
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(exclude_id)
        .fetch_optional(conn)
        .await?;

        if conflict.is_some() {
            return Err(AppError::OverlappingRequest);
        }
        Ok(())
    }

    /// Resolve the period covering `date`, materializing the April-to-March
    /// default when the company has none covering it.
    async fn resolve_period_in(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        date: NaiveDate,
    ) -> Result<VacationPeriod, AppError> {
        let periods = sqlx::query_as::<_, VacationPeriod>(
            "SELECT * FROM vacation_periods WHERE company_id = $1 AND is_active ORDER BY start_date",
        )
        .bind(company_id)
        .fetch_all(&mut *conn)
        .await?;

        if let Some(period) = resolve_period(&periods, date) {
            return Ok(period.clone());
        }

        let (start, end) = default_period_bounds(date);
        let has_default: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vacation_periods WHERE company_id = $1 AND is_default)",
        )
        .bind(company_id)
        .fetch_one(&mut *conn)
        .await?;

        let now = self.clock.now();
        let period = sqlx::query_as::<_, VacationPeriod>(
            r#"
            INSERT INTO vacation_periods (
                period_id, company_id, name, start_date, end_date,
                is_default, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(company_id)
        .bind(default_period_name(start))
        .bind(start)
        .bind(end)
        .bind(!has_default.0)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::info!(
            company_id = %company_id,
            period = %period.name,
            "Materialized default vacation period"
        );

        Ok(period)
    }

    /// Lock (creating if absent) the allocation row for (user, period).
    async fn lock_allocation_in(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        user_id: Uuid,
        period_id: Uuid,
    ) -> Result<VacationAllocation, AppError> {
        let existing = sqlx::query_as::<_, VacationAllocation>(
            "SELECT * FROM vacation_allocations WHERE user_id = $1 AND period_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(period_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(allocation) = existing {
            return Ok(allocation);
        }

        let now = self.clock.now();
        let allocation = sqlx::query_as::<_, VacationAllocation>(
            r#"
            INSERT INTO vacation_allocations (
                allocation_id, company_id, user_id, period_id,
                total_days, carried_over_days, days_used, notes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 0, 0, 0, NULL, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(company_id)
        .bind(user_id)
        .bind(period_id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(allocation)
    }

    /// Approver check beyond the matrix scope: never the owner, and a
    /// manager must manage a team the owner actively belongs to.
    async fn check_approver(
        &self,
        principal: &Principal,
        request: &VacationRequest,
        scope: &ScopePredicate,
    ) -> Result<(), AppError> {
        if principal.user_id == request.user_id {
            return Err(AppError::NotAuthorized(
                "requests cannot be decided by their owner".into(),
            ));
        }
        if let Some(team_ids) = &scope.team_ids {
            if !self
                .membership_repo
                .user_in_teams(request.user_id, team_ids)
                .await?
            {
                return Err(AppError::NotAuthorized(
                    "requester is not on a managed team".into(),
                ));
            }
        }
        Ok(())
    }

    fn status_snapshot(request: &VacationRequest) -> serde_json::Value {
        serde_json::json!({
            "status": request.status,
            "days_count": request.days_count,
            "start_date": request.start_date,
            "end_date": request.end_date,
        })
    }
}

#[async_trait]
impl VacationService for PgVacationService {
    async fn create_request(
        &self,
        principal: &Principal,
        req: CreateVacationReq,
    ) -> Result<VacationResp, AppError> {
        authorize(principal, Action::Create, Resource::VacationRequest)?;
        self.validate_dates(req.start_date, req.end_date)?;

        // Requests are tagged with a team for manager visibility; default to
        // the owner's primary (first active) membership.
        let team_id = match req.team_id {
            Some(team_id) => {
                let member_teams = self.membership_repo.active_team_ids(principal.user_id).await?;
                if !member_teams.contains(&team_id) {
                    return Err(AppError::InvalidInput(
                        "you are not a member of that team".into(),
                    ));
                }
                Some(team_id)
            },
            None => self
                .membership_repo
                .active_team_ids(principal.user_id)
                .await?
                .into_iter()
                .next(),
        };

        let now = self.clock.now();
        let status = if req.draft {
            RequestStatus::Draft
        } else {
            RequestStatus::Pending
        };

        let mut tx = self.pool.begin().await?;

        Self::lock_user_requests(&mut *tx, principal.user_id).await?;

        // Drafts stay out of the overlap set and carry no period until
        // submission.
        let (period_id, days_count) = if req.draft {
            (None, business_days(req.start_date, req.end_date))
        } else {
            Self::check_overlap_in(&mut *tx, principal.user_id, req.start_date, req.end_date, None)
                .await?;
            let period = self
                .resolve_period_in(&mut *tx, principal.company_id, req.start_date)
                .await?;
            (
                Some(period.period_id),
                business_days(req.start_date, req.end_date),
            )
        };

        let request = sqlx::query_as::<_, VacationRequest>(
            r#"
            INSERT INTO vacation_requests (
                request_id, company_id, user_id, team_id,
                start_date, end_date, vacation_type, status, reason,
                approver_id, approved_at, rejected_reason,
                period_id, days_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL, NULL, NULL, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(principal.company_id)
        .bind(principal.user_id)
        .bind(team_id)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.vacation_type)
        .bind(status)
        .bind(&req.reason)
        .bind(period_id)
        .bind(days_count)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        PgAuditSink::record_in(
            &mut *tx,
            NewAuditEvent::new(principal.company_id, actions::REQUEST_CREATED, "vacation_request")
                .actor(principal.user_id)
                .entity(request.request_id)
                .after(Self::status_snapshot(&request)),
        )
        .await?;

        tx.commit().await?;

        Ok(VacationResp::from(&request))
    }

    async fn get_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> Result<VacationResp, AppError> {
        let scope = authorize(principal, Action::Read, Resource::VacationRequest)?;
        let request = self.fetch_checked(principal, request_id).await?;
        self.check_request_in_scope(&request, &scope).await?;
        Ok(VacationResp::from(&request))
    }

    async fn list_requests(
        &self,
        principal: &Principal,
        filter: VacationFilter,
        page: i32,
        page_size: i32,
    ) -> Result<VacationListResp, AppError> {
        let scope = authorize(principal, Action::List, Resource::VacationRequest)?;

        let (requests, total) = self
            .request_repo
            .list(&scope, &filter, page, page_size)
            .await?;

        Ok(VacationListResp {
            requests: requests.iter().map(VacationResp::from).collect(),
            total,
            page,
            page_size,
        })
    }

    async fn modify_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
        req: ModifyVacationReq,
    ) -> Result<VacationResp, AppError> {
        authorize(principal, Action::Update, Resource::VacationRequest)?;
        let request = self.fetch_checked(principal, request_id).await?;

        if request.user_id != principal.user_id {
            return Err(AppError::NotAuthorized("only the owner may edit a draft".into()));
        }
        self.validate_dates(req.start_date, req.end_date)?;

        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, VacationRequest>(
            "SELECT * FROM vacation_requests WHERE request_id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        if locked.status != RequestStatus::Draft {
            return Err(AppError::Conflict("only drafts can be modified".into()));
        }

        let updated = sqlx::query_as::<_, VacationRequest>(
            r#"
            UPDATE vacation_requests
            SET start_date = $2,
                end_date = $3,
                vacation_type = $4,
                reason = $5,
                team_id = $6,
                days_count = $7,
                updated_at = $8
            WHERE request_id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.vacation_type)
        .bind(&req.reason)
        .bind(req.team_id.or(locked.team_id))
        .bind(business_days(req.start_date, req.end_date))
        .bind(self.clock.now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(VacationResp::from(&updated))
    }

    async fn submit_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> Result<VacationResp, AppError> {
        authorize(principal, Action::Update, Resource::VacationRequest)?;
        let request = self.fetch_checked(principal, request_id).await?;

        if request.user_id != principal.user_id {
            return Err(AppError::NotAuthorized("only the owner may submit".into()));
        }

        let mut tx = self.pool.begin().await?;

        Self::lock_user_requests(&mut *tx, principal.user_id).await?;

        let locked = sqlx::query_as::<_, VacationRequest>(
            "SELECT * FROM vacation_requests WHERE request_id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        if locked.status != RequestStatus::Draft {
            return Err(AppError::Conflict("only drafts can be submitted".into()));
        }
        self.validate_dates(locked.start_date, locked.end_date)?;

        Self::check_overlap_in(
            &mut *tx,
            principal.user_id,
            locked.start_date,
            locked.end_date,
            Some(request_id),
        )
        .await?;

        // Period and day count freeze at submission.
        let period = self
            .resolve_period_in(&mut *tx, principal.company_id, locked.start_date)
            .await?;
        let days_count = business_days(locked.start_date, locked.end_date);

        let updated = sqlx::query_as::<_, VacationRequest>(
            r#"
            UPDATE vacation_requests
            SET status = 'pending',
                period_id = $2,
                days_count = $3,
                updated_at = $4
            WHERE request_id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(period.period_id)
        .bind(days_count)
        .bind(self.clock.now())
        .fetch_one(&mut *tx)
        .await?;

        PgAuditSink::record_in(
            &mut *tx,
            NewAuditEvent::new(principal.company_id, actions::REQUEST_SUBMITTED, "vacation_request")
                .actor(principal.user_id)
                .entity(request_id)
                .before(Self::status_snapshot(&locked))
                .after(Self::status_snapshot(&updated)),
        )
        .await?;

        tx.commit().await?;

        Ok(VacationResp::from(&updated))
    }

    async fn approve_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
        req: ApproveReq,
    ) -> Result<VacationResp, AppError> {
        let scope = authorize(principal, Action::Approve, Resource::VacationRequest)?;
        let request = self.fetch_checked(principal, request_id).await?;
        self.check_approver(principal, &request, &scope).await?;

        let company = self.company(principal.company_id).await?;
        let now = self.clock.now();

        let mut tx = self.pool.begin().await?;

        // The row lock is held until the allocation update commits; the
        // losing approver re-reads a non-pending status.
        let locked = sqlx::query_as::<_, VacationRequest>(
            "SELECT * FROM vacation_requests WHERE request_id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        if locked.status != RequestStatus::Pending {
            return Err(AppError::NotPending);
        }

        let period_id = locked
            .period_id
            .ok_or_else(|| AppError::Internal("pending request without period".into()))?;

        let allocation = self
            .lock_allocation_in(&mut *tx, locked.company_id, locked.user_id, period_id)
            .await?;

        let remaining_after = allocation.remaining() - locked.days_count;
        if remaining_after < 0 && !company.allows_negative_balance() {
            return Err(AppError::AllocationExceeded);
        }

        let updated = sqlx::query_as::<_, VacationRequest>(
            r#"
            UPDATE vacation_requests
            SET status = 'approved',
                approver_id = $2,
                approved_at = $3,
                updated_at = $3
            WHERE request_id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(principal.user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE vacation_allocations
            SET days_used = days_used + $2,
                updated_at = $3
            WHERE allocation_id = $1
            "#,
        )
        .bind(allocation.allocation_id)
        .bind(locked.days_count)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut after = Self::status_snapshot(&updated);
        if let Some(comment) = &req.comment {
            after["comment"] = serde_json::Value::String(comment.clone());
        }
        PgAuditSink::record_in(
            &mut *tx,
            NewAuditEvent::new(principal.company_id, actions::REQUEST_APPROVED, "vacation_request")
                .actor(principal.user_id)
                .entity(request_id)
                .before(Self::status_snapshot(&locked))
                .after(after),
        )
        .await?;

        tx.commit().await?;

        Ok(VacationResp::from(&updated))
    }

    async fn reject_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
        req: RejectReq,
    ) -> Result<VacationResp, AppError> {
        let scope = authorize(principal, Action::Reject, Resource::VacationRequest)?;
        let request = self.fetch_checked(principal, request_id).await?;
        self.check_approver(principal, &request, &scope).await?;

        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, VacationRequest>(
            "SELECT * FROM vacation_requests WHERE request_id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        if locked.status != RequestStatus::Pending {
            return Err(AppError::NotPending);
        }

        let updated = sqlx::query_as::<_, VacationRequest>(
            r#"
            UPDATE vacation_requests
            SET status = 'rejected',
                approver_id = $2,
                rejected_reason = $3,
                updated_at = $4
            WHERE request_id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(principal.user_id)
        .bind(&req.reason)
        .bind(self.clock.now())
        .fetch_one(&mut *tx)
        .await?;

        PgAuditSink::record_in(
            &mut *tx,
            NewAuditEvent::new(principal.company_id, actions::REQUEST_REJECTED, "vacation_request")
                .actor(principal.user_id)
                .entity(request_id)
                .before(Self::status_snapshot(&locked))
                .after(Self::status_snapshot(&updated)),
        )
        .await?;

        tx.commit().await?;

        Ok(VacationResp::from(&updated))
    }

    async fn cancel_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> Result<VacationResp, AppError> {
        let scope = authorize(principal, Action::Cancel, Resource::VacationRequest)?;
        let request = self.fetch_checked(principal, request_id).await?;

        let is_owner = request.user_id == principal.user_id;
        if !is_owner {
            // Non-owners need admin rights or management of the owner's team.
            match principal.role {
                Role::Admin => {},
                Role::Manager => {
                    if !self
                        .membership_repo
                        .user_in_teams(request.user_id, &principal.managed_team_ids)
                        .await?
                    {
                        return Err(AppError::NotAuthorized(
                            "requester is not on a managed team".into(),
                        ));
                    }
                },
                Role::User => {
                    return Err(AppError::NotAuthorized(
                        "only the owner may cancel this request".into(),
                    ));
                },
            }
        } else {
            self.check_request_in_scope(&request, &scope).await?;
        }

        let now = self.clock.now();
        let today = now.date_naive();

        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, VacationRequest>(
            "SELECT * FROM vacation_requests WHERE request_id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        if locked.status.is_terminal() {
            return Err(AppError::NotPending);
        }

        let was_approved = locked.status == RequestStatus::Approved;

        // Owner-cancel of an approved request is a withdrawal, allowed only
        // before the vacation starts.
        let (new_status, action) = if was_approved && is_owner {
            if today >= locked.start_date {
                return Err(AppError::Conflict(
                    "approved requests can no longer be withdrawn once started".into(),
                ));
            }
            (RequestStatus::Withdrawn, actions::REQUEST_WITHDRAWN)
        } else {
            (RequestStatus::Cancelled, actions::REQUEST_CANCELLED)
        };

        let updated = sqlx::query_as::<_, VacationRequest>(
            r#"
            UPDATE vacation_requests
            SET status = $2,
                updated_at = $3
            WHERE request_id = $1
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(new_status)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        // Leaving the approved state returns its days to the allocation.
        if was_approved {
            let period_id = locked
                .period_id
                .ok_or_else(|| AppError::Internal("approved request without period".into()))?;
            let allocation = self
                .lock_allocation_in(&mut *tx, locked.company_id, locked.user_id, period_id)
                .await?;
            sqlx::query(
                r#"
                UPDATE vacation_allocations
                SET days_used = days_used - $2,
                    updated_at = $3
                WHERE allocation_id = $1
                "#,
            )
            .bind(allocation.allocation_id)
            .bind(locked.days_count)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        PgAuditSink::record_in(
            &mut *tx,
            NewAuditEvent::new(principal.company_id, action, "vacation_request")
                .actor(principal.user_id)
                .entity(request_id)
                .before(Self::status_snapshot(&locked))
                .after(Self::status_snapshot(&updated)),
        )
        .await?;

        tx.commit().await?;

        Ok(VacationResp::from(&updated))
    }

    async fn balance(&self, principal: &Principal) -> Result<Vec<BalanceResp>, AppError> {
        authorize(principal, Action::Read, Resource::VacationAllocation)?;

        let allocations = self.allocation_repo.list_for_user(principal.user_id).await?;

        let mut balances = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            let Some(period) = self
                .period_repo
                .find_by_id(principal.company_id, allocation.period_id)
                .await?
            else {
                continue;
            };

            let pending_days = self
                .request_repo
                .pending_days(principal.user_id, allocation.period_id)
                .await?;

            balances.push(BalanceResp {
                period: PeriodResp::from(&period),
                total_days: allocation.total_days,
                carried_over_days: allocation.carried_over_days,
                days_used: allocation.days_used,
                pending_days,
                remaining: allocation.remaining(),
            });
        }

        Ok(balances)
    }
}
