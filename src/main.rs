//! Astral Server: multi-tenant document storage
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use astral_api::{AppState, build_router};
use astral_auth::{AuthService, MemorySessionStore, PgSessionStore, SessionStore};
use astral_cache::CacheManager;
use astral_core::config::AppConfig;
use astral_core::error::AppError;
use astral_database::DatabasePool;
use astral_database::repositories::{TokenRepository, UserRepository};
use astral_service::FileService;
use astral_storage::StorageManager;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `ASTRAL_ENV` overlay, and `ASTRAL_*` variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("ASTRAL_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Astral v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Session store ────────────────────────────────────
    let (session_store, db_pool): (Arc<dyn SessionStore>, Option<DatabasePool>) =
        match config.database.provider.as_str() {
            "postgres" => {
                let pool = DatabasePool::connect_and_migrate(&config.database).await?;
                let store = PgSessionStore::new(
                    UserRepository::new(pool.pool().clone()),
                    TokenRepository::new(pool.pool().clone()),
                );
                (Arc::new(store), Some(pool))
            }
            "memory" => {
                tracing::warn!("Using in-memory session store; sessions are lost on restart");
                (Arc::new(MemorySessionStore::new()), None)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown database provider: '{other}'. Supported: postgres, memory"
                )));
            }
        };

    // ── Step 2: Cache ────────────────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache...");
    let cache = Arc::new(CacheManager::new(&config.cache).await?);

    // ── Step 3: Object storage ───────────────────────────────────
    tracing::info!(provider = %config.storage.provider, "Initializing object storage...");
    let storage = StorageManager::new(&config.storage).await?.backend();

    // ── Step 4: Auth ─────────────────────────────────────────────
    if config.auth.admin_token.is_empty() {
        tracing::warn!("auth.admin_token is empty; registration is disabled");
    }
    let auth = Arc::new(AuthService::new(&config.auth, session_store)?);

    // ── Step 5: Services ─────────────────────────────────────────
    let file_service = Arc::new(FileService::new(
        Arc::clone(&storage),
        Arc::clone(&cache),
        &config.storage,
        &config.cache,
    ));

    // ── Step 6: Router ───────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        cache,
        storage,
        auth,
        file_service,
    };
    let app = build_router(state);

    // ── Step 7: Serve with graceful shutdown ─────────────────────
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Astral server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("Astral server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
