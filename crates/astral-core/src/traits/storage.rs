//! Object backend trait for pluggable document storage.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// A byte stream type used for object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Metadata about a stored object, as reported by the backend.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ObjectInfo {
    /// Full object key (`{owner}/{id}`).
    pub key: String,
    /// Size of the object body in bytes.
    pub size_bytes: u64,
    /// Content type recorded at write time.
    pub content_type: String,
    /// Last modification time reported by the backend.
    pub last_modified: DateTime<Utc>,
    /// User metadata attached to the object.
    pub metadata: HashMap<String, String>,
}

/// Trait for object storage backends.
///
/// Objects are addressed by flat keys of the form `{owner}/{id}`; all
/// descriptive attributes live in the object's metadata map, there is no
/// side table. Implementations map their own not-found conditions to
/// [`ErrorKind::NotFound`].
#[async_trait]
pub trait ObjectBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type name (e.g., "memory", "local", "s3").
    fn backend_type(&self) -> &str;

    /// Check whether the backend is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store an object body together with its metadata.
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        metadata: &HashMap<String, String>,
        content: ByteStream,
        size_bytes: u64,
    ) -> AppResult<ObjectInfo>;

    /// Open an object body for reading.
    async fn get_object(&self, key: &str) -> AppResult<ByteStream>;

    /// Read object metadata without the body.
    async fn stat_object(&self, key: &str) -> AppResult<ObjectInfo>;

    /// Remove an object.
    async fn delete_object(&self, key: &str) -> AppResult<()>;

    /// List all objects whose key starts with `prefix`.
    async fn list_objects(&self, prefix: &str) -> AppResult<Vec<ObjectInfo>>;

    /// Find an object by the id part of its key, regardless of owner.
    async fn find_object(&self, object_id: &str) -> AppResult<Option<ObjectInfo>> {
        let suffix = format!("/{object_id}");
        Ok(self
            .list_objects("")
            .await?
            .into_iter()
            .find(|object| object.key.ends_with(&suffix)))
    }
}

/// Drain a byte stream into a single contiguous buffer.
pub async fn collect_bytes(mut stream: ByteStream) -> AppResult<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Object stream read error", e)
        })?;
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// Wrap an in-memory buffer as a single-chunk [`ByteStream`].
pub fn bytes_stream(data: Bytes) -> ByteStream {
    Box::pin(futures::stream::once(async move { Ok(data) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_bytes_joins_chunks() {
        let chunks = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let stream: ByteStream = Box::pin(futures::stream::iter(chunks));
        let data = collect_bytes(stream).await.unwrap();
        assert_eq!(&data[..], b"hello world");
    }

    #[tokio::test]
    async fn test_collect_bytes_surfaces_stream_error() {
        let chunks = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("connection reset")),
        ];
        let stream: ByteStream = Box::pin(futures::stream::iter(chunks));
        let err = collect_bytes(stream).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }
}
