use async_trait::async_trait;
use chrono::Utc;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;
use vacation_service_core::domains::identity::domain::{
    model::{Company, Function, Team},
    repository::{CompanyRepository, OrgRepository},
};

/// PostgreSQL implementation of CompanyRepository
#[derive(Clone)]
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn find_by_id(&self, company_id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE company_id = $1 AND deleted_at IS NULL",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE slug = $1 AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    async fn create(&self, company: &Company) -> Result<Company, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (
                company_id, name, slug, domain, settings,
                created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(company.company_id)
        .bind(&company.name)
        .bind(&company.slug)
        .bind(&company.domain)
        .bind(&company.settings)
        .bind(company.created_at)
        .bind(company.updated_at)
        .bind(company.deleted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(company)
    }
}

/// PostgreSQL implementation of OrgRepository (functions and teams)
#[derive(Clone)]
pub struct PgOrgRepository {
    pool: PgPool,
}

impl PgOrgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrgRepository for PgOrgRepository {
    async fn find_function(
        &self,
        company_id: Uuid,
        function_id: Uuid,
    ) -> Result<Option<Function>, AppError> {
        let function = sqlx::query_as::<_, Function>(
            "SELECT * FROM functions WHERE function_id = $1 AND company_id = $2 AND deleted_at IS NULL",
        )
        .bind(function_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(function)
    }

    async fn list_functions(&self, company_id: Uuid) -> Result<Vec<Function>, AppError> {
        let functions = sqlx::query_as::<_, Function>(
            "SELECT * FROM functions WHERE company_id = $1 AND deleted_at IS NULL ORDER BY code",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(functions)
    }

    async fn create_function(&self, function: &Function) -> Result<Function, AppError> {
        let function = sqlx::query_as::<_, Function>(
            r#"
            INSERT INTO functions (
                function_id, company_id, name, code,
                created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(function.function_id)
        .bind(function.company_id)
        .bind(&function.name)
        .bind(&function.code)
        .bind(function.created_at)
        .bind(function.updated_at)
        .bind(function.deleted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(function)
    }

    async fn find_team(&self, company_id: Uuid, team_id: Uuid) -> Result<Option<Team>, AppError> {
        let team = sqlx::query_as::<_, Team>(
            "SELECT * FROM teams WHERE team_id = $1 AND company_id = $2 AND deleted_at IS NULL",
        )
        .bind(team_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn list_teams(&self, company_id: Uuid) -> Result<Vec<Team>, AppError> {
        let teams = sqlx::query_as::<_, Team>(
            "SELECT * FROM teams WHERE company_id = $1 AND deleted_at IS NULL ORDER BY code",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    async fn create_team(&self, team: &Team) -> Result<Team, AppError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (
                team_id, company_id, function_id, name, code,
                created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(team.team_id)
        .bind(team.company_id)
        .bind(team.function_id)
        .bind(&team.name)
        .bind(&team.code)
        .bind(team.created_at)
        .bind(team.updated_at)
        .bind(team.deleted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(team)
    }

    async fn ensure_default_function(&self, company_id: Uuid) -> Result<Function, AppError> {
        if let Some(existing) = sqlx::query_as::<_, Function>(
            "SELECT * FROM functions WHERE company_id = $1 AND code = 'general' AND deleted_at IS NULL",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let function = Function {
            function_id: Uuid::now_v7(),
            company_id,
            name: "General".to_string(),
            code: "general".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        // A concurrent creation loses the unique race; re-read in that case.
        match self.create_function(&function).await {
            Ok(created) => Ok(created),
            Err(AppError::DuplicateUniqueKey(_)) => sqlx::query_as::<_, Function>(
                "SELECT * FROM functions WHERE company_id = $1 AND code = 'general' AND deleted_at IS NULL",
            )
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Internal("default function vanished".to_string())),
            Err(e) => Err(e),
        }
    }
}
