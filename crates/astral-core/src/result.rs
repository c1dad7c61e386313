//! Convenience result type alias for Astral.

use crate::error::AppError;

/// A specialized `Result` type for Astral operations.
pub type AppResult<T> = Result<T, AppError>;
