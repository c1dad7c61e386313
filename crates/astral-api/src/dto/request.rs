//! Request DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// POST /api/register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Admin token.
    pub token: String,
    pub login: String,
    pub pswd: String,
}

/// POST /api/auth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub pswd: String,
}

/// The `meta` part of an upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocMeta {
    #[serde(default)]
    pub name: String,
    /// Whether the upload carries byte content.
    #[serde(default)]
    pub file: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub grant: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// GET /api/docs query. `limit` stays a string so a bad value maps to
/// `INVALID_INPUT` instead of a framework rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub login: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
    pub limit: Option<String>,
}

/// Owner hint for single-document routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocQuery {
    pub login: Option<String>,
}
