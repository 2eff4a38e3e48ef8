use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_auth::ScopePredicate;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;
use vacation_service_core::domains::identity::domain::{model::User, repository::UserRepository};
use vacation_service_core::domains::identity::dto::UserFilter;

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE lower(email) = lower($1) AND is_active AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, company_id: Uuid, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE user_id = $1 AND company_id = $2 AND is_active AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id_any_status(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE user_id = $1 AND company_id = $2 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                user_id, company_id, function_id, email, password_hash,
                first_name, last_name, role, is_active, email_verified,
                last_login_at, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(user.user_id)
        .bind(user.company_id)
        .bind(user.function_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.email_verified)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.deleted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = $3,
                last_name = $4,
                role = $5,
                is_active = $6,
                email_verified = $7,
                updated_at = NOW()
            WHERE user_id = $1 AND company_id = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(user.user_id)
        .bind(user.company_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.email_verified)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(
        &self,
        scope: &ScopePredicate,
        filter: &UserFilter,
        page: i32,
        page_size: i32,
    ) -> Result<(Vec<User>, i64), AppError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let offset = ((page as i64) - 1) * (page_size as i64);

        // Build query dynamically using QueryBuilder; the scope predicate is
        // mandatory input, so there is no tenant-less path.
        let mut query_builder =
            sqlx::QueryBuilder::new("SELECT u.* FROM users u WHERE u.company_id = ");
        query_builder.push_bind(scope.company_id);
        query_builder.push(" AND u.deleted_at IS NULL");

        let mut count_builder =
            sqlx::QueryBuilder::new("SELECT COUNT(*) FROM users u WHERE u.company_id = ");
        count_builder.push_bind(scope.company_id);
        count_builder.push(" AND u.deleted_at IS NULL");

        if let Some(role) = filter.role {
            query_builder.push(" AND u.role = ");
            query_builder.push_bind(role);
            count_builder.push(" AND u.role = ");
            count_builder.push_bind(role);
        }

        if let Some(is_active) = filter.is_active {
            query_builder.push(" AND u.is_active = ");
            query_builder.push_bind(is_active);
            count_builder.push(" AND u.is_active = ");
            count_builder.push_bind(is_active);
        }

        if let Some(user_id) = scope.user_id {
            query_builder.push(" AND u.user_id = ");
            query_builder.push_bind(user_id);
            count_builder.push(" AND u.user_id = ");
            count_builder.push_bind(user_id);
        }

        if let Some(team_ids) = &scope.team_ids {
            let clause = " AND EXISTS (SELECT 1 FROM team_memberships tm WHERE tm.user_id = u.user_id AND tm.left_at IS NULL AND tm.team_id = ANY(";
            query_builder.push(clause);
            query_builder.push_bind(team_ids.clone());
            query_builder.push("))");
            count_builder.push(clause);
            count_builder.push_bind(team_ids.clone());
            count_builder.push("))");
        }

        query_builder.push(" ORDER BY u.created_at DESC LIMIT ");
        query_builder.push_bind(page_size as i64);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let total: (i64,) = count_builder
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let users = query_builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        Ok((users, total.0))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn soft_delete(&self, company_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = NOW(),
                is_active = FALSE,
                updated_at = NOW()
            WHERE user_id = $1 AND company_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
