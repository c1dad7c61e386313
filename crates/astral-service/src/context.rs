//! Request context carrying the authenticated login and its session token.

use serde::{Deserialize, Serialize};

/// Context for the current authenticated request.
///
/// Built by the boundary after the bearer token is authorized and passed
/// into every service method, so each operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated login.
    pub login: String,
    /// The session token the request was authorized with.
    pub token: String,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(login: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            token: token.into(),
        }
    }
}
