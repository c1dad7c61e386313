//! HS512 signing and verification of session tokens.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use astral_core::config::AuthConfig;
use astral_core::error::AppError;
use astral_core::result::AppResult;

use super::claims::SessionClaims;

const LEEWAY_SECONDS: u64 = 5;

/// Signs and verifies session tokens carrying `{login, expiry}`.
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionTokenCodec {
    /// Creates a codec from auth configuration. An empty secret is refused.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let ttl = i64::try_from(config.token_ttl_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or_else(|| AppError::configuration("auth.token_ttl_hours is out of range"))?;
        Self::with_ttl(&config.jwt_secret, ttl)
    }

    /// Creates a codec with an explicit lifetime.
    pub fn with_ttl(secret: &str, ttl: Duration) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must be set"));
        }

        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = LEEWAY_SECONDS;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Mints a signed token for `login`.
    pub fn issue(&self, login: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            login: login.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode session token: {e}")))
    }

    /// Checks signature and expiry and returns the embedded claims.
    pub fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                AppError::invalid_token("invalid token")
            })
    }
}
