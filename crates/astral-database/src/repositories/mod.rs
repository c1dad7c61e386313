//! Repository implementations for the session store tables.

pub mod token;
pub mod user;

pub use token::TokenRepository;
pub use user::UserRepository;

use astral_core::error::{AppError, ErrorKind};
use tracing::error;

/// Log a query failure where it happened and hide it behind an internal error.
pub(crate) fn query_failed(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        error!(error = %e, "{context}");
        AppError::with_source(ErrorKind::Internal, context, e)
    }
}
