//! In-memory session store for tests and single-node development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use astral_core::error::AppError;
use astral_core::result::AppResult;
use astral_entity::session::{CreateToken, SessionToken};
use astral_entity::user::{CreateUser, User};

use super::store::SessionStore;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    tokens: HashMap<String, SessionToken>,
}

/// Session store kept in process memory behind a single lock.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&data.login) {
            return Err(AppError::user_already_exists(
                "user with this login already exists",
            ));
        }

        let now = Utc::now();
        let user = User {
            login: data.login,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.login.clone(), user.clone());
        Ok(user)
    }

    async fn get_user_by_login(&self, login: &str) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(login).cloned())
    }

    async fn create_token(&self, data: CreateToken) -> AppResult<SessionToken> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&data.owner_login) {
            return Err(AppError::not_found("user not found"));
        }
        if tables.tokens.contains_key(&data.token) {
            return Err(AppError::internal("token already issued"));
        }

        let token = SessionToken {
            token: data.token,
            owner_login: data.owner_login,
            created_at: Utc::now(),
            deleted_at: None,
        };
        tables.tokens.insert(token.token.clone(), token.clone());
        Ok(token)
    }

    async fn list_active_tokens_by_login(&self, login: &str) -> AppResult<Vec<SessionToken>> {
        let tables = self.tables.read().await;
        let mut active: Vec<SessionToken> = tables
            .tokens
            .values()
            .filter(|t| t.owner_login == login && t.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }

    async fn revoke_token(&self, token: &str) -> AppResult<SessionToken> {
        let mut tables = self.tables.write().await;
        match tables.tokens.get_mut(token) {
            Some(entry) if entry.is_active() => {
                entry.deleted_at = Some(Utc::now());
                Ok(entry.clone())
            }
            _ => Err(AppError::not_found("token not found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astral_core::error::ErrorKind;

    async fn store_with_user() -> MemorySessionStore {
        let store = MemorySessionStore::new();
        store
            .create_user(CreateUser {
                login: "astralusr1".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        store
    }

    fn token(value: &str) -> CreateToken {
        CreateToken {
            token: value.to_string(),
            owner_login: "astralusr1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_login() {
        let store = store_with_user().await;
        let err = store
            .create_user(CreateUser {
                login: "astralusr1".to_string(),
                password_hash: "other".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UserAlreadyExists);
    }

    #[tokio::test]
    async fn test_revoke_keeps_tombstone() {
        let store = store_with_user().await;
        store.create_token(token("t1")).await.unwrap();
        store.create_token(token("t2")).await.unwrap();
        assert_eq!(store.list_active_tokens_by_login("astralusr1").await.unwrap().len(), 2);

        let revoked = store.revoke_token("t1").await.unwrap();
        assert!(!revoked.is_active());

        let active = store.list_active_tokens_by_login("astralusr1").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].token, "t2");

        // The tombstone stays and cannot be revoked twice.
        assert_eq!(
            store.revoke_token("t1").await.unwrap_err().kind,
            ErrorKind::NotFound
        );
        assert!(store.tables.read().await.tokens.contains_key("t1"));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let store = store_with_user().await;
        let err = store.revoke_token("missing").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_token_requires_existing_user() {
        let store = MemorySessionStore::new();
        assert!(store.create_token(token("t1")).await.is_err());
    }
}
