use shared_error::AppError;
use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;

/// Initialize database connection pool
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| AppError::ConfigError(format!("Failed to connect to database: {}", e)))
}

/// Apply pending migrations from the embedded `migrations/` directory.
///
/// Migrations are versioned and applied linearly; sqlx records the applied
/// version in its metadata table.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::ConfigError(format!("Migration failed: {}", e)))?;
    tracing::info!("Database migrations applied");
    Ok(())
}
