//! Session token repository implementation.

use sqlx::PgPool;

use astral_core::error::AppError;
use astral_core::result::AppResult;
use astral_entity::session::{CreateToken, SessionToken};

use super::query_failed;

/// Repository for issued session tokens.
///
/// Rows are never deleted; revocation stamps `deleted_at`.
#[derive(Debug, Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    /// Create a new token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly issued token.
    pub async fn create(&self, data: &CreateToken) -> AppResult<SessionToken> {
        sqlx::query_as::<_, SessionToken>(
            "INSERT INTO tokens (token, user_login) \
             VALUES ($1, $2) \
             RETURNING *",
        )
        .bind(&data.token)
        .bind(&data.owner_login)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed("Failed to create token"))
    }

    /// List the tokens of a user that have not been revoked.
    pub async fn find_active_by_login(&self, login: &str) -> AppResult<Vec<SessionToken>> {
        sqlx::query_as::<_, SessionToken>(
            "SELECT * FROM tokens \
             WHERE user_login = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC",
        )
        .bind(login)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to list active tokens"))
    }

    /// Tombstone an active token. Fails with `NotFound` if the token is
    /// unknown or already revoked.
    pub async fn revoke(&self, token: &str) -> AppResult<SessionToken> {
        sqlx::query_as::<_, SessionToken>(
            "UPDATE tokens SET deleted_at = NOW() \
             WHERE token = $1 AND deleted_at IS NULL \
             RETURNING *",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed("Failed to revoke token"))?
        .ok_or_else(|| AppError::not_found("token not found"))
    }
}
