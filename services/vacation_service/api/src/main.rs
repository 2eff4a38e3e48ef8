use clap::{Parser, Subcommand};
use shared_auth::{Principal, Role};
use shared_config::Config;
use shared_error::AppError;
use std::net::SocketAddr;
use std::process::ExitCode;
use uuid::Uuid;

use futures::StreamExt;
use vacation_service_api::{build_state, create_router};
use vacation_service_core::domains::auth::utils::password::{
    validate_password_policy, PasswordHasher,
};
use vacation_service_core::domains::identity::domain::model::{Company, User};
use vacation_service_core::domains::identity::domain::repository::{
    CompanyRepository, OrgRepository, UserRepository,
};
use vacation_service_core::domains::vacation::domain::service::ExportService;
use vacation_service_core::domains::vacation::dto::ExportFilter;
use vacation_service_infra::identity::{PgCompanyRepository, PgOrgRepository, PgUserRepository};
use vacation_service_infra::vacation::PgExportService;

#[derive(Parser)]
#[command(name = "vacation-planner", about = "Multi-tenant vacation planning backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Create the seed company and admin account from configuration
    SeedAdmin,
    /// Write all vacation requests of a company to stdout as CSV
    BackupExport {
        /// Company slug to export
        #[arg(long)]
        company: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}

async fn run(command: Command) -> Result<(), AppError> {
    let config =
        Config::from_env().map_err(|e| AppError::ConfigError(e.to_string()))?;

    let pool = shared_db::init_pool(&config.database_url, 10).await?;

    match command {
        Command::Serve => serve(pool, config).await,
        Command::Migrate => shared_db::run_migrations(&pool).await,
        Command::SeedAdmin => seed_admin(pool, &config).await,
        Command::BackupExport { company } => backup_export(pool, &company).await,
    }
}

async fn serve(pool: shared_db::PgPool, config: Config) -> Result<(), AppError> {
    shared_db::run_migrations(&pool).await?;

    let state = build_state(pool, &config)?;
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::ConfigError(format!("Invalid listen address: {}", e)))?;

    tracing::info!("Vacation planner listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::ConfigError(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::Internal(format!("Server error: {}", e)))
}

/// Create (or reuse) the seed company and provision the admin account named
/// in ADMIN_SEED_EMAIL / ADMIN_SEED_PASSWORD.
async fn seed_admin(pool: shared_db::PgPool, config: &Config) -> Result<(), AppError> {
    let email = config
        .admin_seed_email
        .as_deref()
        .ok_or_else(|| AppError::ConfigError("ADMIN_SEED_EMAIL must be set".into()))?;
    let password = config
        .admin_seed_password
        .as_deref()
        .ok_or_else(|| AppError::ConfigError("ADMIN_SEED_PASSWORD must be set".into()))?;

    validate_password_policy(password)?;

    shared_db::run_migrations(&pool).await?;

    let company_repo = PgCompanyRepository::new(pool.clone());
    let org_repo = PgOrgRepository::new(pool.clone());
    let user_repo = PgUserRepository::new(pool.clone());

    let now = chrono::Utc::now();
    let company = match company_repo.find_by_slug("default").await? {
        Some(company) => company,
        None => {
            company_repo
                .create(&Company {
                    company_id: Uuid::now_v7(),
                    name: "Default".to_string(),
                    slug: "default".to_string(),
                    domain: None,
                    settings: sqlx::types::Json(serde_json::json!({})),
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                })
                .await?
        },
    };

    if user_repo.email_exists(email).await? {
        eprintln!("admin account already exists, nothing to do");
        return Ok(());
    }

    let function = org_repo.ensure_default_function(company.company_id).await?;

    let hasher = PasswordHasher::with_params(
        config.hash_time_cost,
        config.hash_memory_kib,
        config.hash_parallelism,
    )?;
    let password_hash = hasher.hash(password)?;

    let admin = user_repo
        .create(&User {
            user_id: Uuid::now_v7(),
            company_id: company.company_id,
            function_id: function.function_id,
            email: email.to_string(),
            password_hash,
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            role: Role::Admin,
            is_active: true,
            email_verified: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .await?;

    eprintln!(
        "seeded admin {} in company {} ({})",
        admin.email, company.name, company.company_id
    );
    Ok(())
}

/// Stream every request of a company to stdout as CSV rows.
async fn backup_export(pool: shared_db::PgPool, company_slug: &str) -> Result<(), AppError> {
    let company_repo = PgCompanyRepository::new(pool.clone());
    let company = company_repo
        .find_by_slug(company_slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("company {}", company_slug)))?;

    // Exports run under an administrative principal for the company.
    let principal = Principal {
        user_id: Uuid::nil(),
        company_id: company.company_id,
        role: Role::Admin,
        managed_team_ids: Vec::new(),
    };

    let export = PgExportService::new(pool);
    let mut rows = export
        .export_rows(&principal, ExportFilter::default())
        .await?;

    print!("{}", vacation_service_api::export_handlers::CSV_HEADER);
    let mut count: u64 = 0;
    while let Some(row) = rows.next().await {
        let row = row?;
        print!("{}", vacation_service_api::export_handlers::row_to_csv(&row));
        count += 1;
    }

    eprintln!("exported {} rows for company {}", count, company.name);
    Ok(())
}
