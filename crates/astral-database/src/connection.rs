//! PostgreSQL pool backing the session store.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{error, info};

use astral_core::config::DatabaseConfig;
use astral_core::error::{AppError, ErrorKind};
use astral_core::result::AppResult;

use crate::migration::run_migrations;

/// Connection pool for the `users` and `tokens` tables.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connect using `database.url` and the pool limits from configuration.
    ///
    /// Only host, port and database name are logged, never credentials.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = PgConnectOptions::from_str(&config.url).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid database.url", e)
        })?;

        info!(
            host = options.get_host(),
            port = options.get_port(),
            database = options.get_database().unwrap_or_default(),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to connect to database");
                AppError::with_source(ErrorKind::Internal, "Failed to connect to database", e)
            })?;

        Ok(Self { pool })
    }

    /// Connect and bring the schema up to date.
    pub async fn connect_and_migrate(config: &DatabaseConfig) -> AppResult<Self> {
        let db = Self::connect(config).await?;
        run_migrations(&db.pool).await?;
        Ok(db)
    }

    /// Underlying sqlx pool, cloned into each repository.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Drain and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
