//! Route definitions for the Astral HTTP API.
//!
//! All routes are mounted under `/api`. `GET` routes also answer `HEAD`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Room for multipart framing and the `meta`/`json` parts on top of the
/// content limit enforced by the file engine.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.storage.max_upload_size_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(doc_routes())
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Registration, login, session close
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/auth", post(handlers::auth::login))
        .route("/auth/{token}", delete(handlers::auth::logout))
}

/// Document upload, listing, download, delete
fn doc_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/docs",
            get(handlers::docs::list).post(handlers::docs::upload),
        )
        .route(
            "/docs/{id}",
            get(handlers::docs::get).delete(handlers::docs::delete),
        )
}
