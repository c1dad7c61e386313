//! The session store interface and its PostgreSQL implementation.

use std::fmt;

use async_trait::async_trait;

use astral_core::result::AppResult;
use astral_database::repositories::{TokenRepository, UserRepository};
use astral_entity::session::{CreateToken, SessionToken};
use astral_entity::user::{CreateUser, User};

/// Persistence of users and issued tokens.
#[async_trait]
pub trait SessionStore: Send + Sync + fmt::Debug + 'static {
    /// Insert a user; a taken login yields `UserAlreadyExists`.
    async fn create_user(&self, data: CreateUser) -> AppResult<User>;

    async fn get_user_by_login(&self, login: &str) -> AppResult<Option<User>>;

    async fn create_token(&self, data: CreateToken) -> AppResult<SessionToken>;

    /// Tokens of `login` that have not been revoked.
    async fn list_active_tokens_by_login(&self, login: &str) -> AppResult<Vec<SessionToken>>;

    /// Tombstone an active token; unknown or already revoked tokens yield
    /// `NotFound`.
    async fn revoke_token(&self, token: &str) -> AppResult<SessionToken>;
}

/// Session store backed by the `users` and `tokens` tables.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    users: UserRepository,
    tokens: TokenRepository,
}

impl PgSessionStore {
    pub fn new(users: UserRepository, tokens: TokenRepository) -> Self {
        Self { users, tokens }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        self.users.create(&data).await
    }

    async fn get_user_by_login(&self, login: &str) -> AppResult<Option<User>> {
        self.users.find_by_login(login).await
    }

    async fn create_token(&self, data: CreateToken) -> AppResult<SessionToken> {
        self.tokens.create(&data).await
    }

    async fn list_active_tokens_by_login(&self, login: &str) -> AppResult<Vec<SessionToken>> {
        self.tokens.find_active_by_login(login).await
    }

    async fn revoke_token(&self, token: &str) -> AppResult<SessionToken> {
        self.tokens.revoke(token).await
    }
}
