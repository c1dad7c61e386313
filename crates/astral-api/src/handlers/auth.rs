//! Registration, login and session close handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};

use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{ApiResponse, RegisterResponse, TokenResponse};
use crate::error::ApiError;
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>, ApiError> {
    let user = state.auth.register(&req.token, &req.login, &req.pswd).await?;
    Ok(Json(ApiResponse::ok(RegisterResponse { login: user.login })))
}

/// POST /api/auth
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let session = state.auth.login(&req.login, &req.pswd).await?;
    Ok(Json(ApiResponse::ok(TokenResponse {
        token: session.token,
    })))
}

/// DELETE /api/auth/{token}
///
/// The caller may close any of its own sessions, including the one used
/// to authorize this request.
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<BTreeMap<String, bool>>>, ApiError> {
    let closed = state.auth.close_session(&auth.login, &token).await?;
    Ok(Json(ApiResponse::ok(BTreeMap::from([(closed.token, true)]))))
}
