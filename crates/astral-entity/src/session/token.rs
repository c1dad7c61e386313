//! Session token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An issued bearer token. Revocation tombstones the row via `deleted_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionToken {
    /// The signed token string.
    pub token: String,
    /// Login of the user the token was issued to.
    #[sqlx(rename = "user_login")]
    pub owner_login: String,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// When the token was revoked, if it was.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    /// A token is active until it is revoked.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Data required to persist a freshly minted token.
#[derive(Debug, Clone)]
pub struct CreateToken {
    /// The signed token string.
    pub token: String,
    /// Owner login.
    pub owner_login: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active() {
        let mut token = SessionToken {
            token: "abc".to_string(),
            owner_login: "astralusr1".to_string(),
            created_at: Utc::now(),
            deleted_at: None,
        };
        assert!(token.is_active());

        token.deleted_at = Some(Utc::now());
        assert!(!token.is_active());
    }
}
