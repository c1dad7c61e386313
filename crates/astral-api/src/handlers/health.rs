//! Health check handler.

use axum::Json;
use axum::extract::State;

use astral_core::traits::cache::CacheProvider;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let cache = state.cache.health_check().await.unwrap_or(false);
    let storage = state.storage.health_check().await.unwrap_or(false);

    Json(ApiResponse::ok(HealthResponse {
        status: if cache && storage { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache,
        storage,
    }))
}
