//! # astral-api
//!
//! HTTP boundary for Astral built on Axum. Handlers are thin wrappers over
//! `AuthService` and `FileService`; this crate owns the response envelope,
//! the error to status mapping and the `ETag` / `If-None-Match` handling.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
