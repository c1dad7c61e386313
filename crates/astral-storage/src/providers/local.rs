//! Local filesystem object backend.
//!
//! Each object `{owner}/{id}` is stored as a body file at
//! `<root>/{owner}/{id}` plus a JSON sidecar at `<root>/{owner}/{id}.meta.json`
//! carrying content type and user metadata.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use astral_core::error::{AppError, ErrorKind};
use astral_core::result::AppResult;
use astral_core::traits::storage::{ByteStream, ObjectBackend, ObjectInfo};

const SIDECAR_SUFFIX: &str = ".meta.json";
const PARTIAL_SUFFIX: &str = ".partial";

/// Sidecar contents stored next to each object body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sidecar {
    content_type: String,
    metadata: HashMap<String, String>,
}

/// Local filesystem object backend.
#[derive(Debug, Clone)]
pub struct LocalObjectBackend {
    /// Root directory for all stored objects.
    root: PathBuf,
}

/// A path segment that stays inside its parent directory.
fn is_plain_segment(part: &str) -> bool {
    !part.is_empty() && part != "." && part != ".." && !part.contains('\\')
}

/// Log an I/O failure at its origin and hide the details from callers.
fn io_failed(context: String, e: std::io::Error) -> AppError {
    error!(error = %e, "{context}");
    AppError::with_source(ErrorKind::Internal, context, e)
}

impl LocalObjectBackend {
    /// Create a new backend rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            io_failed(format!("Failed to create storage root: {}", root.display()), e)
        })?;
        Ok(Self { root })
    }

    /// Resolve an object key to its body path, rejecting keys that escape the root.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let clean = key.trim_start_matches('/');
        if clean.is_empty() || !clean.split('/').all(is_plain_segment) {
            return Err(AppError::internal(format!("Invalid object key: {key}")));
        }
        Ok(self.root.join(clean))
    }

    fn sidecar_path(body: &Path) -> PathBuf {
        let mut name = body.as_os_str().to_owned();
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }

    fn partial_path(body: &Path) -> PathBuf {
        let mut name = body.as_os_str().to_owned();
        name.push(PARTIAL_SUFFIX);
        PathBuf::from(name)
    }

    async fn read_info(&self, key: &str, body: &Path) -> AppResult<ObjectInfo> {
        let fs_meta = match fs::metadata(body).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found(format!("object not found: {key}")));
            }
            Err(e) => return Err(io_failed(format!("Failed to stat object: {key}"), e)),
        };

        let raw = match fs::read(Self::sidecar_path(body)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found(format!("object not found: {key}")));
            }
            Err(e) => return Err(io_failed(format!("Failed to read sidecar: {key}"), e)),
        };
        let sidecar: Sidecar = serde_json::from_slice(&raw)?;

        let last_modified = fs_meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(ObjectInfo {
            key: key.to_string(),
            size_bytes: fs_meta.len(),
            content_type: sidecar.content_type,
            last_modified,
            metadata: sidecar.metadata,
        })
    }

    async fn owner_dirs(&self) -> AppResult<Vec<String>> {
        let mut owners = Vec::new();
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| io_failed("Failed to read storage root".to_string(), e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_failed("Failed to read storage root".to_string(), e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                owners.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(owners)
    }
}

#[async_trait]
impl ObjectBackend for LocalObjectBackend {
    fn backend_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.exists() && self.root.is_dir())
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        metadata: &HashMap<String, String>,
        mut content: ByteStream,
        _size_bytes: u64,
    ) -> AppResult<ObjectInfo> {
        let body = self.resolve(key)?;
        if let Some(parent) = body.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                io_failed(format!("Failed to create directory: {}", parent.display()), e)
            })?;
        }

        let sidecar = serde_json::to_vec(&Sidecar {
            content_type: content_type.to_string(),
            metadata: metadata.clone(),
        })?;

        // Body goes to a partial file first so a failed write never leaves a
        // readable object behind.
        let partial = Self::partial_path(&body);
        let mut file = fs::File::create(&partial)
            .await
            .map_err(|e| io_failed(format!("Failed to create object: {key}"), e))?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = content.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = fs::remove_file(&partial).await;
                    return Err(io_failed(format!("Stream read error for object: {key}"), e));
                }
            };
            total_bytes += chunk.len() as u64;
            if let Err(e) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&partial).await;
                return Err(io_failed(format!("Failed to write object: {key}"), e));
            }
        }
        if let Err(e) = file.flush().await {
            let _ = fs::remove_file(&partial).await;
            return Err(io_failed(format!("Failed to flush object: {key}"), e));
        }
        drop(file);

        let sidecar_path = Self::sidecar_path(&body);
        if let Err(e) = fs::write(&sidecar_path, &sidecar).await {
            let _ = fs::remove_file(&partial).await;
            let _ = fs::remove_file(&sidecar_path).await;
            return Err(io_failed(format!("Failed to write sidecar: {key}"), e));
        }
        if let Err(e) = fs::rename(&partial, &body).await {
            let _ = fs::remove_file(&partial).await;
            let _ = fs::remove_file(&sidecar_path).await;
            return Err(io_failed(format!("Failed to commit object: {key}"), e));
        }

        debug!(key, bytes = total_bytes, "Wrote object");
        self.read_info(key, &body).await
    }

    async fn get_object(&self, key: &str) -> AppResult<ByteStream> {
        let body = self.resolve(key)?;
        let file = fs::File::open(&body).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("object not found: {key}"))
            } else {
                io_failed(format!("Failed to open object: {key}"), e)
            }
        })?;

        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn stat_object(&self, key: &str) -> AppResult<ObjectInfo> {
        let body = self.resolve(key)?;
        self.read_info(key, &body).await
    }

    async fn delete_object(&self, key: &str) -> AppResult<()> {
        let body = self.resolve(key)?;
        fs::remove_file(&body).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("object not found: {key}"))
            } else {
                io_failed(format!("Failed to delete object: {key}"), e)
            }
        })?;

        if let Err(e) = fs::remove_file(Self::sidecar_path(&body)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(io_failed(format!("Failed to delete sidecar: {key}"), e));
            }
        }

        debug!(key, "Deleted object");
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> AppResult<Vec<ObjectInfo>> {
        let owners = match prefix.split_once('/') {
            // No stored key can carry such an owner segment.
            Some((owner, _)) if !is_plain_segment(owner) => return Ok(Vec::new()),
            Some((owner, _)) => vec![owner.to_string()],
            None => self.owner_dirs().await?,
        };

        let mut objects = Vec::new();
        for owner in owners {
            let dir = self.root.join(&owner);
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_failed(format!("Failed to list objects of {owner}"), e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| io_failed(format!("Failed to list objects of {owner}"), e))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.ends_with(SIDECAR_SUFFIX) || name.ends_with(PARTIAL_SUFFIX) {
                    continue;
                }
                let key = format!("{owner}/{name}");
                if !key.starts_with(prefix) {
                    continue;
                }
                match self.read_info(&key, &entry.path()).await {
                    Ok(info) => objects.push(info),
                    // Deleted between read_dir and stat.
                    Err(e) if e.kind == ErrorKind::NotFound => continue,
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astral_core::traits::storage::{bytes_stream, collect_bytes};
    use bytes::Bytes;

    async fn backend(dir: &tempfile::TempDir) -> LocalObjectBackend {
        LocalObjectBackend::new(dir.path().to_str().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir).await;
        let meta = HashMap::from([("public".to_string(), "true".to_string())]);

        let info = backend
            .put_object(
                "alice/doc",
                "text/plain",
                &meta,
                bytes_stream(Bytes::from("hello world")),
                11,
            )
            .await
            .unwrap();
        assert_eq!(info.size_bytes, 11);
        assert_eq!(info.content_type, "text/plain");
        assert_eq!(info.metadata, meta);

        let data = collect_bytes(backend.get_object("alice/doc").await.unwrap())
            .await
            .unwrap();
        assert_eq!(data, Bytes::from("hello world"));

        backend.delete_object("alice/doc").await.unwrap();
        let err = backend.stat_object("alice/doc").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_skips_sidecars_and_filters_by_owner() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir).await;

        for key in ["alice/a", "alice/b", "bob/c"] {
            backend
                .put_object(key, "text/plain", &HashMap::new(), bytes_stream(Bytes::from("x")), 1)
                .await
                .unwrap();
        }

        let mut alice: Vec<String> = backend
            .list_objects("alice/")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        alice.sort();
        assert_eq!(alice, vec!["alice/a".to_string(), "alice/b".to_string()]);

        assert_eq!(backend.list_objects("").await.unwrap().len(), 3);
        assert!(backend.list_objects("carol/").await.unwrap().is_empty());

        let found = backend.find_object("c").await.unwrap().unwrap();
        assert_eq!(found.key, "bob/c");
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir).await;
        assert!(backend.stat_object("../etc/passwd").await.is_err());
        assert!(backend.get_object("alice/../../x").await.is_err());
    }

    #[tokio::test]
    async fn test_list_never_leaves_the_root() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("objects");
        let backend = LocalObjectBackend::new(root.to_str().unwrap()).await.unwrap();
        backend
            .put_object("alice/a", "text/plain", &HashMap::new(), bytes_stream(Bytes::from("x")), 1)
            .await
            .unwrap();

        // A sibling of the root that looks like an owner directory one level up.
        std::fs::write(outer.path().join("leak"), b"secret").unwrap();
        let sidecar = br#"{"content_type":"text/plain","metadata":{}}"#;
        std::fs::write(outer.path().join("leak.meta.json"), sidecar).unwrap();

        for prefix in ["../", "./", "/alice/", "..\\/"] {
            assert!(backend.list_objects(prefix).await.unwrap().is_empty(), "{prefix}");
        }
        assert_eq!(backend.list_objects("alice/").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_no_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir).await;

        // A directory at the body path makes the final rename fail.
        std::fs::create_dir_all(dir.path().join("alice/doc/child")).unwrap();

        let body = bytes_stream(Bytes::from("x"));
        let result = backend
            .put_object("alice/doc", "text/plain", &HashMap::new(), body, 1)
            .await;
        assert!(result.is_err());

        let mut leftovers: Vec<String> = std::fs::read_dir(dir.path().join("alice"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        leftovers.sort();
        assert_eq!(leftovers, vec!["doc".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir).await;
        let err = backend.delete_object("alice/none").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
