use async_trait::async_trait;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;
use vacation_service_core::domains::identity::domain::{
    model::{ManagerAssignment, TeamMembership},
    repository::MembershipRepository,
};

/// PostgreSQL implementation of MembershipRepository
#[derive(Clone)]
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    async fn active_team_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT team_id FROM team_memberships WHERE user_id = $1 AND left_at IS NULL",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn managed_team_ids(&self, manager_user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT team_id FROM manager_assignments WHERE manager_user_id = $1",
        )
        .bind(manager_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn add_member(&self, membership: &TeamMembership) -> Result<TeamMembership, AppError> {
        let membership = sqlx::query_as::<_, TeamMembership>(
            r#"
            INSERT INTO team_memberships (
                membership_id, company_id, user_id, team_id,
                is_primary, joined_at, left_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(membership.membership_id)
        .bind(membership.company_id)
        .bind(membership.user_id)
        .bind(membership.team_id)
        .bind(membership.is_primary)
        .bind(membership.joined_at)
        .bind(membership.left_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(membership)
    }

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE team_memberships
            SET left_at = NOW()
            WHERE team_id = $1 AND user_id = $2 AND left_at IS NULL
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn assign_manager(
        &self,
        assignment: &ManagerAssignment,
    ) -> Result<ManagerAssignment, AppError> {
        let assignment = sqlx::query_as::<_, ManagerAssignment>(
            r#"
            INSERT INTO manager_assignments (
                assignment_id, company_id, manager_user_id, team_id,
                assigned_by, assigned_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(assignment.assignment_id)
        .bind(assignment.company_id)
        .bind(assignment.manager_user_id)
        .bind(assignment.team_id)
        .bind(assignment.assigned_by)
        .bind(assignment.assigned_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(assignment)
    }

    async fn user_in_teams(&self, user_id: Uuid, team_ids: &[Uuid]) -> Result<bool, AppError> {
        if team_ids.is_empty() {
            return Ok(false);
        }

        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM team_memberships
                WHERE user_id = $1 AND left_at IS NULL AND team_id = ANY($2)
            )
            "#,
        )
        .bind(user_id)
        .bind(team_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }
}
