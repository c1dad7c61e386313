//! User repository implementation.

use sqlx::PgPool;

use astral_core::error::AppError;
use astral_core::result::AppResult;
use astral_entity::user::{CreateUser, User};

use super::query_failed;

/// Repository for user rows.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by login.
    pub async fn find_by_login(&self, login: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("Failed to find user by login"))
    }

    /// Insert a new user. A duplicate login yields `UserAlreadyExists`.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (login, password_hash) \
             VALUES ($1, $2) \
             RETURNING *",
        )
        .bind(&data.login)
        .bind(&data.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => Err(
                AppError::user_already_exists("user with this login already exists"),
            ),
            Err(e) => Err(query_failed("Failed to create user")(e)),
        }
    }
}
