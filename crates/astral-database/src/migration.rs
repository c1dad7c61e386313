//! Database migration runner.

use sqlx::PgPool;
use tracing::{error, info};

use astral_core::error::{AppError, ErrorKind};

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to run migrations");
            AppError::with_source(ErrorKind::Internal, "Failed to run migrations", e)
        })?;

    info!("Database migrations completed successfully");
    Ok(())
}
