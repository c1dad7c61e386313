//! In-memory object backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use astral_core::error::AppError;
use astral_core::result::AppResult;
use astral_core::traits::storage::{
    ByteStream, ObjectBackend, ObjectInfo, bytes_stream, collect_bytes,
};

#[derive(Debug, Clone)]
struct StoredObject {
    info: ObjectInfo,
    body: Bytes,
}

/// Object backend keeping every object in a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectBackend {
    objects: Arc<DashMap<String, StoredObject>>,
}

impl MemoryObjectBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the backend holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn missing(key: &str) -> AppError {
    AppError::not_found(format!("object not found: {key}"))
}

#[async_trait]
impl ObjectBackend for MemoryObjectBackend {
    fn backend_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        metadata: &HashMap<String, String>,
        content: ByteStream,
        _size_bytes: u64,
    ) -> AppResult<ObjectInfo> {
        let body = collect_bytes(content).await?;
        let info = ObjectInfo {
            key: key.to_string(),
            size_bytes: body.len() as u64,
            content_type: content_type.to_string(),
            last_modified: Utc::now(),
            metadata: metadata.clone(),
        };

        self.objects.insert(
            key.to_string(),
            StoredObject {
                info: info.clone(),
                body,
            },
        );
        debug!(key, size = info.size_bytes, "Stored object in memory");
        Ok(info)
    }

    async fn get_object(&self, key: &str) -> AppResult<ByteStream> {
        let body = self
            .objects
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| missing(key))?;
        Ok(bytes_stream(body))
    }

    async fn stat_object(&self, key: &str) -> AppResult<ObjectInfo> {
        self.objects
            .get(key)
            .map(|object| object.info.clone())
            .ok_or_else(|| missing(key))
    }

    async fn delete_object(&self, key: &str) -> AppResult<()> {
        self.objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| missing(key))
    }

    async fn list_objects(&self, prefix: &str) -> AppResult<Vec<ObjectInfo>> {
        Ok(self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.value().info.clone())
            .collect())
    }
}
