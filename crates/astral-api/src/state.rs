//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use astral_auth::AuthService;
use astral_cache::CacheManager;
use astral_core::config::AppConfig;
use astral_core::traits::storage::ObjectBackend;
use astral_service::FileService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Cache manager (Redis or in-memory)
    pub cache: Arc<CacheManager>,
    /// Selected object backend
    pub storage: Arc<dyn ObjectBackend>,
    /// Authorization engine
    pub auth: Arc<AuthService>,
    /// File engine
    pub file_service: Arc<FileService>,
}
