//! Authorization engine: registration, login, token checks, session close.

use std::sync::Arc;
use std::time::Duration;

use subtle::ConstantTimeEq;
use tracing::{info, warn};

use astral_core::config::AuthConfig;
use astral_core::error::{AppError, ErrorKind};
use astral_core::result::AppResult;
use astral_core::time::with_timeout;
use astral_entity::session::{CreateToken, SessionToken};
use astral_entity::user::{CreateUser, User};

use crate::jwt::SessionTokenCodec;
use crate::password::{CredentialPolicy, PasswordHasher, UserDataValidator};
use crate::session::SessionStore;

/// Orchestrates the hasher, the token codec and the session store.
///
/// A token is accepted only when its signature is valid *and* it is still
/// listed among the owner's active sessions, so revocation applies at once.
#[derive(Debug, Clone)]
pub struct AuthService {
    store: Arc<dyn SessionStore>,
    hasher: Arc<PasswordHasher>,
    codec: Arc<SessionTokenCodec>,
    validator: Arc<dyn UserDataValidator>,
    admin_token: String,
    store_timeout: Duration,
}

impl AuthService {
    /// Builds the engine with the default credential policy.
    pub fn new(config: &AuthConfig, store: Arc<dyn SessionStore>) -> AppResult<Self> {
        Ok(Self {
            store,
            hasher: Arc::new(PasswordHasher::new(&config.password_hash)?),
            codec: Arc::new(SessionTokenCodec::new(config)?),
            validator: Arc::new(CredentialPolicy::default()),
            admin_token: config.admin_token.clone(),
            store_timeout: Duration::from_secs(config.operation_timeout_seconds),
        })
    }

    /// Replaces the credential validator.
    pub fn with_validator(mut self, validator: Arc<dyn UserDataValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replaces the token codec.
    pub fn with_codec(mut self, codec: SessionTokenCodec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Creates a user. Requires the preconfigured admin token.
    pub async fn register(
        &self,
        admin_token: &str,
        login: &str,
        password: &str,
    ) -> AppResult<User> {
        if !self.is_admin_token(admin_token) {
            warn!(login = %login, "Registration attempt with a bad admin token");
            return Err(AppError::access_denied("access denied"));
        }

        self.validator.validate_user_data(login, password)?;

        let hasher = Arc::clone(&self.hasher);
        let plain = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash_password(&plain))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))??;

        let user = with_timeout(
            self.store_timeout,
            "create_user",
            self.store.create_user(CreateUser {
                login: login.to_string(),
                password_hash,
            }),
        )
        .await?;

        info!(login = %user.login, "User registered");
        Ok(user)
    }

    /// Checks credentials and opens a new session.
    ///
    /// Unknown logins and wrong passwords are indistinguishable.
    pub async fn login(&self, login: &str, password: &str) -> AppResult<SessionToken> {
        let user = with_timeout(
            self.store_timeout,
            "get_user_by_login",
            self.store.get_user_by_login(login),
        )
        .await?
        .ok_or_else(|| AppError::access_denied("access denied"))?;

        let hasher = Arc::clone(&self.hasher);
        let plain = password.to_string();
        let stored = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || hasher.verify_password(&plain, &stored))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))??;

        if !valid {
            warn!(login = %login, "Login failed");
            return Err(AppError::access_denied("access denied"));
        }

        let token = self.codec.issue(&user.login)?;
        let session = with_timeout(
            self.store_timeout,
            "create_token",
            self.store.create_token(CreateToken {
                token,
                owner_login: user.login.clone(),
            }),
        )
        .await?;

        info!(login = %user.login, "Session opened");
        Ok(session)
    }

    /// Validates a presented token and returns its active session.
    pub async fn authorize(&self, token: &str) -> AppResult<SessionToken> {
        let claims = self.codec.verify(token)?;
        self.find_active(&claims.login, token).await
    }

    /// Revokes `token` if it is one of `login`'s active sessions.
    pub async fn close_session(&self, login: &str, token: &str) -> AppResult<SessionToken> {
        self.find_active(login, token).await?;

        let revoke = self.store.revoke_token(token);
        let revoked = with_timeout(self.store_timeout, "revoke_token", revoke)
            .await
            .map_err(|e| match e.kind {
                // Lost a race with a concurrent close.
                ErrorKind::NotFound => AppError::access_denied("access denied"),
                _ => e,
            })?;

        info!(login = %login, "Session closed");
        Ok(revoked)
    }

    async fn find_active(&self, login: &str, token: &str) -> AppResult<SessionToken> {
        let active = with_timeout(
            self.store_timeout,
            "list_active_tokens_by_login",
            self.store.list_active_tokens_by_login(login),
        )
        .await?;

        active
            .into_iter()
            .find(|session| session.token == token)
            .ok_or_else(|| AppError::access_denied("access denied"))
    }

    fn is_admin_token(&self, presented: &str) -> bool {
        !self.admin_token.is_empty()
            && bool::from(self.admin_token.as_bytes().ct_eq(presented.as_bytes()))
    }
}
