//! Redis cache provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use astral_core::config::cache::RedisCacheConfig;
use astral_core::error::{AppError, ErrorKind};
use astral_core::result::AppResult;
use astral_core::traits::cache::CacheProvider;

use super::client::RedisClient;

/// Redis-backed cache provider.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    /// Redis client.
    client: RedisClient,
    /// `COUNT` hint per `SCAN` call.
    scan_batch_size: usize,
    /// Cap on `SCAN` round trips per prefix deletion.
    max_scan_iterations: usize,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient, config: &RedisCacheConfig) -> Self {
        Self {
            client,
            scan_batch_size: config.scan_batch_size.max(1),
            max_scan_iterations: config.max_scan_iterations.max(1),
        }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Internal, format!("Redis error: {e}"), e)
    }
}

/// Escape glob metacharacters so a literal prefix can be used in `MATCH`.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    fn provider_type(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: Option<String> = conn.get(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .set_ex(&full_key, value, ttl.as_secs().max(1))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: bool = conn.exists(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64> {
        let pattern = format!("{}*", escape_glob(&self.client.prefixed_key(prefix)));
        let mut conn = self.client.conn_mut();
        let mut cursor: u64 = 0;
        let mut deleted = 0u64;

        for _ in 0..self.max_scan_iterations {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(self.scan_batch_size)
                .query_async(&mut conn)
                .await
                .map_err(Self::map_err)?;

            if !keys.is_empty() {
                let mut pipe = redis::pipe();
                for key in &keys {
                    pipe.del(key).ignore();
                }
                let _: () = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;
                deleted += keys.len() as u64;
            }

            cursor = next;
            if cursor == 0 {
                debug!(prefix, deleted, "Deleted keys by prefix");
                return Ok(deleted);
            }
        }

        warn!(
            prefix,
            deleted,
            max_iterations = self.max_scan_iterations,
            "Prefix deletion stopped at scan iteration limit"
        );
        Ok(deleted)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }

    async fn flush_all(&self) -> AppResult<()> {
        // Scoped to the configured key prefix.
        self.delete_prefix("").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("astral:list:bob:"), "astral:list:bob:");
        assert_eq!(escape_glob("a*b?[c]\\"), "a\\*b\\?\\[c\\]\\\\");
    }
}
