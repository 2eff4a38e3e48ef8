use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;
use vacation_service_core::domains::auth::domain::{
    model::InviteToken, repository::InviteRepository,
};

/// PostgreSQL implementation of InviteRepository
#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    async fn create(&self, invite: &InviteToken) -> Result<InviteToken, AppError> {
        let invite = sqlx::query_as::<_, InviteToken>(
            r#"
            INSERT INTO invite_tokens (
                invite_id, company_id, function_id, team_ids, token_hash,
                email, invited_role, invited_by, expires_at, used_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(invite.invite_id)
        .bind(invite.company_id)
        .bind(invite.function_id)
        .bind(&invite.team_ids)
        .bind(&invite.token_hash)
        .bind(&invite.email)
        .bind(invite.invited_role)
        .bind(invite.invited_by)
        .bind(invite.expires_at)
        .bind(invite.used_at)
        .bind(invite.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(invite)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<InviteToken>, AppError> {
        let invite = sqlx::query_as::<_, InviteToken>(
            "SELECT * FROM invite_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }

    async fn find_by_id(
        &self,
        company_id: Uuid,
        invite_id: Uuid,
    ) -> Result<Option<InviteToken>, AppError> {
        let invite = sqlx::query_as::<_, InviteToken>(
            "SELECT * FROM invite_tokens WHERE invite_id = $1 AND company_id = $2",
        )
        .bind(invite_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }

    async fn find_pending_by_email(
        &self,
        company_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<InviteToken>, AppError> {
        let invite = sqlx::query_as::<_, InviteToken>(
            r#"
            SELECT * FROM invite_tokens
            WHERE company_id = $1
              AND lower(email) = lower($2)
              AND used_at IS NULL
              AND expires_at > $3
            "#,
        )
        .bind(company_id)
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }

    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InviteToken>, AppError> {
        let invites = sqlx::query_as::<_, InviteToken>(
            r#"
            SELECT * FROM invite_tokens
            WHERE company_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(invites)
    }

    async fn mark_used(&self, invite_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        // The used_at guard makes acceptance single-shot under concurrency.
        let result = sqlx::query(
            "UPDATE invite_tokens SET used_at = $2 WHERE invite_id = $1 AND used_at IS NULL",
        )
        .bind(invite_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, company_id: Uuid, invite_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM invite_tokens WHERE invite_id = $1 AND company_id = $2 AND used_at IS NULL",
        )
        .bind(invite_id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_for_resend(
        &self,
        company_id: Uuid,
        invite_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<InviteToken, AppError> {
        let invite = sqlx::query_as::<_, InviteToken>(
            r#"
            UPDATE invite_tokens
            SET token_hash = $3,
                expires_at = $4
            WHERE invite_id = $1 AND company_id = $2 AND used_at IS NULL
            RETURNING *
            "#,
        )
        .bind(invite_id)
        .bind(company_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::InviteInvalid)?;

        Ok(invite)
    }
}
