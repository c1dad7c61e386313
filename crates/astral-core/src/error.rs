//! Unified application error types for Astral.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Domain kinds travel up to the HTTP
//! boundary verbatim; infrastructure faults are collapsed into
//! [`ErrorKind::Internal`] before they leave the crate that produced them.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Authorization failed: wrong owner, revoked session, bad admin token.
    AccessDenied,
    /// The bearer token is malformed, expired, or carries a bad signature.
    InvalidToken,
    /// Login or password violates one or more credential rules.
    ValidationFailed,
    /// A user with the requested login already exists.
    UserAlreadyExists,
    /// The uploaded content exceeds the size ceiling.
    FileTooLarge,
    /// The file name is empty, too long, or contains path components.
    InvalidFileName,
    /// The requested user, token, or file does not exist.
    NotFound,
    /// The request could not be decoded at the boundary.
    InvalidInput,
    /// Startup configuration is missing or invalid.
    Configuration,
    /// Opaque backend or infrastructure failure.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessDenied => write!(f, "ACCESS_DENIED"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::ValidationFailed => write!(f, "VALIDATION_FAILED"),
            Self::UserAlreadyExists => write!(f, "USER_ALREADY_EXISTS"),
            Self::FileTooLarge => write!(f, "FILE_TOO_LARGE"),
            Self::InvalidFileName => write!(f, "INVALID_FILE_NAME"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidInput => write!(f, "INVALID_INPUT"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Astral.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an access-denied error.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccessDenied, message)
    }

    /// Create an invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    /// Create a credential validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }

    /// Create a duplicate-user error.
    pub fn user_already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserAlreadyExists, message)
    }

    /// Create a file-too-large error.
    pub fn file_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileTooLarge, message)
    }

    /// Create an invalid-file-name error.
    pub fn invalid_file_name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFileName, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns `true` for infrastructure faults whose message must not reach callers.
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, ErrorKind::Internal | ErrorKind::Configuration)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Internal,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::with_source(ErrorKind::Internal, "Backend operation timed out", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::access_denied("access denied");
        assert_eq!(err.to_string(), "ACCESS_DENIED: access denied");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("disk gone");
        let err = AppError::from(io);
        assert!(std::error::Error::source(&err).is_some());

        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Internal);
        assert!(std::error::Error::source(&cloned).is_none());
    }

    #[test]
    fn test_internal_classification() {
        assert!(AppError::internal("boom").is_internal());
        assert!(AppError::configuration("bad").is_internal());
        assert!(!AppError::not_found("nope").is_internal());
        assert!(!AppError::file_too_large("big").is_internal());
    }
}
