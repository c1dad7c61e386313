//! File engine: upload, list, fetch and delete with cache-aside coordination.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use astral_cache::CacheManager;
use astral_cache::keys;
use astral_core::config::{CacheConfig, StorageConfig};
use astral_core::error::{AppError, ErrorKind};
use astral_core::result::AppResult;
use astral_core::time::with_timeout;
use astral_core::traits::cache::CacheProvider;
use astral_core::traits::storage::{ObjectBackend, ObjectInfo, bytes_stream, collect_bytes};
use astral_core::types::FileFilter;
use astral_entity::file::metadata::{
    decode_object, detect_content_type, encode_object_metadata, object_key, owner_prefix,
    sanitize_grant, sanitize_metadata,
};
use astral_entity::file::{CachedFile, File, NewFile, StoredFile};

use crate::context::RequestContext;

use super::cache_aside::{read_through_detached, write_through_blocking};
use super::filter::apply_filter;

/// Longest accepted file name, in characters.
const MAX_NAME_LENGTH: usize = 255;

/// Orchestrates the object backend and the TTL cache.
///
/// The backend is the source of truth. Cache entries are a disposable view:
/// every cache failure is logged and treated as a miss or a skipped write.
#[derive(Debug, Clone)]
pub struct FileService {
    backend: Arc<dyn ObjectBackend>,
    cache: Arc<CacheManager>,
    cache_ttl: Duration,
    cache_timeout: Duration,
    metadata_timeout: Duration,
    transfer_timeout: Duration,
    max_upload_size: u64,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        cache: Arc<CacheManager>,
        storage: &StorageConfig,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            backend,
            cache,
            cache_ttl: Duration::from_secs(cache_config.default_ttl_seconds),
            cache_timeout: Duration::from_secs(cache_config.operation_timeout_seconds),
            metadata_timeout: Duration::from_secs(storage.metadata_timeout_seconds),
            transfer_timeout: Duration::from_secs(storage.transfer_timeout_seconds),
            max_upload_size: storage.max_upload_size_bytes,
        }
    }

    /// Largest accepted content size in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Stores a new file owned by the caller.
    ///
    /// The per-file cache entry is populated beside the backend write, and
    /// the call returns only after both have settled. Listing entries of the
    /// owner are invalidated once the object is stored.
    pub async fn upload(&self, ctx: &RequestContext, new_file: NewFile) -> AppResult<File> {
        validate_name(&new_file.name)?;

        let size = new_file.size_bytes();
        if size > self.max_upload_size {
            return Err(AppError::file_too_large(format!(
                "file exceeds the maximum size of {} bytes",
                self.max_upload_size
            )));
        }

        let content = if new_file.is_inline_file {
            new_file.content
        } else {
            bytes::Bytes::new()
        };

        let mime_type = new_file
            .mime_type
            .as_deref()
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| detect_content_type(&new_file.name));

        let file = File {
            id: Uuid::new_v4(),
            name: new_file.name,
            is_inline_file: new_file.is_inline_file,
            public: new_file.public,
            mime_type,
            grant: sanitize_grant(&new_file.grant),
            size_bytes: content.len() as u64,
            metadata: sanitize_metadata(&new_file.metadata),
            created_at: Utc::now(),
            owner_login: ctx.login.clone(),
        };

        let key = file.object_key();
        let object_metadata = encode_object_metadata(&file);
        let stored = StoredFile {
            file: file.clone(),
            content: content.clone(),
        };

        let cache_task = self.cache_file_task(stored);
        let write = async {
            with_timeout(
                self.transfer_timeout,
                "put_object",
                self.backend.put_object(
                    &key,
                    &file.mime_type,
                    &object_metadata,
                    bytes_stream(content),
                    file.size_bytes,
                ),
            )
            .await?;
            self.invalidate_listings(&file.owner_login).await;
            Ok(())
        };

        if let Err(e) = write_through_blocking("upload.cache_file", write, cache_task).await {
            // The cache may already hold a file the backend never stored.
            let cache = Arc::clone(&self.cache);
            let cache_key = keys::file_by_id(file.id);
            read_through_detached("upload.evict_file", async move {
                cache.delete(&cache_key).await
            });
            return Err(e);
        }

        info!(
            login = %file.owner_login,
            file_id = %file.id,
            size = file.size_bytes,
            "File uploaded"
        );
        Ok(file)
    }

    /// Lists the files of `owner` (the caller when absent) matching `filter`.
    ///
    /// Files of another owner are narrowed to those the caller may read
    /// before `limit` applies. Cached entries are keyed by owner, viewer and
    /// filter, so a hit is returned as-is.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        owner: Option<&str>,
        filter: &FileFilter,
    ) -> AppResult<Vec<File>> {
        let owner = owner.filter(|o| !o.is_empty()).unwrap_or(&ctx.login);
        let cache_key = keys::file_list(owner, &ctx.login, filter)?;

        if let Some(files) = self.cache_get::<Vec<File>>(&cache_key).await {
            debug!(owner, "File list served from cache");
            return Ok(files);
        }

        let objects = with_timeout(
            self.metadata_timeout,
            "list_objects",
            self.backend.list_objects(&owner_prefix(owner)),
        )
        .await?;

        let mut files: Vec<File> = objects
            .iter()
            .filter_map(decode_listed)
            .filter(|file| owner == ctx.login || file.is_readable_by(&ctx.login))
            .collect();
        files.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let files = apply_filter(files, filter, Utc::now());
        self.cache_put(&cache_key, &files).await;
        Ok(files)
    }

    /// Fetches a file with its content.
    ///
    /// The access check runs on cache hits as well as misses. On a miss the
    /// cache entry is repopulated without the caller waiting.
    pub async fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        owner_hint: Option<&str>,
    ) -> AppResult<StoredFile> {
        let cache_key = keys::file_by_id(id);
        if let Some(cached) = self.cache_get::<CachedFile>(&cache_key).await {
            match StoredFile::try_from(cached) {
                Ok(stored) => {
                    if owner_hint.is_some_and(|hint| !stored.file.is_owned_by(hint)) {
                        return Err(AppError::not_found("file not found"));
                    }
                    ensure_readable(&stored.file, &ctx.login)?;
                    debug!(file_id = %id, "File served from cache");
                    return Ok(stored);
                }
                Err(e) => warn!(file_id = %id, error = %e, "Discarding corrupt cache entry"),
            }
        }

        let info = self.locate(ctx, id, owner_hint).await?;
        let file = decode_object(&info)?;
        ensure_readable(&file, &ctx.login)?;

        let content = with_timeout(self.transfer_timeout, "get_object", async {
            let stream = self.backend.get_object(&info.key).await?;
            collect_bytes(stream).await
        })
        .await
        .map_err(hide_object_key)?;

        let stored = StoredFile { file, content };
        read_through_detached("fetch.cache_file", self.cache_file_task(stored.clone()));
        Ok(stored)
    }

    /// Deletes a file owned by the caller and returns its last metadata.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        owner_hint: Option<&str>,
    ) -> AppResult<File> {
        let info = self.locate(ctx, id, owner_hint).await?;
        let file = decode_object(&info)?;

        if !file.is_owned_by(&ctx.login) {
            info!(login = %ctx.login, file_id = %id, "Delete denied: not the owner");
            return Err(AppError::access_denied("access denied"));
        }

        with_timeout(
            self.metadata_timeout,
            "delete_object",
            self.backend.delete_object(&info.key),
        )
        .await
        .map_err(hide_object_key)?;

        // Evicted before returning so a fetch right after the delete misses.
        let cache_key = keys::file_by_id(id);
        if let Err(e) =
            with_timeout(self.cache_timeout, "cache_delete", self.cache.delete(&cache_key)).await
        {
            warn!(file_id = %id, error = %e, "Failed to evict deleted file from cache");
        }

        let cache = Arc::clone(&self.cache);
        let prefix = keys::file_list_prefix(&file.owner_login);
        read_through_detached("delete.evict_listings", async move {
            cache.delete_prefix(&prefix).await.map(|_| ())
        });

        info!(login = %ctx.login, file_id = %id, "File deleted");
        Ok(file)
    }

    /// Finds the object for `id`: the hinted owner (or the caller) first,
    /// then a backend-wide lookup when no hint was given.
    async fn locate(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        owner_hint: Option<&str>,
    ) -> AppResult<ObjectInfo> {
        let namespace = owner_hint.unwrap_or(&ctx.login);
        let direct = with_timeout(
            self.metadata_timeout,
            "stat_object",
            self.backend.stat_object(&object_key(namespace, id)),
        )
        .await;

        match direct {
            Ok(info) => return Ok(info),
            Err(e) if e.kind == ErrorKind::NotFound && owner_hint.is_none() => {}
            Err(e) => return Err(hide_object_key(e)),
        }

        with_timeout(
            self.metadata_timeout,
            "find_object",
            self.backend.find_object(&id.to_string()),
        )
        .await?
        .ok_or_else(|| AppError::not_found("file not found"))
    }

    fn cache_file_task(
        &self,
        stored: StoredFile,
    ) -> impl Future<Output = AppResult<()>> + Send + 'static {
        let cache = Arc::clone(&self.cache);
        let ttl = self.cache_ttl;
        let timeout = self.cache_timeout;
        async move {
            let value = serde_json::to_string(&CachedFile::from(&stored))?;
            let key = keys::file_by_id(stored.file.id);
            with_timeout(timeout, "cache_set", cache.set(&key, &value, ttl)).await
        }
    }

    async fn invalidate_listings(&self, owner: &str) {
        let prefix = keys::file_list_prefix(owner);
        let removed = with_timeout(
            self.cache_timeout,
            "cache_delete_prefix",
            self.cache.delete_prefix(&prefix),
        )
        .await;
        match removed {
            Ok(removed) => debug!(owner, removed, "Invalidated cached listings"),
            Err(e) => warn!(owner, error = %e, "Failed to invalidate cached listings"),
        }
    }

    /// A failed read or an undecodable entry counts as a miss.
    async fn cache_get<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        match with_timeout(self.cache_timeout, "cache_get", self.cache.get_json(key)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                None
            }
        }
    }

    async fn cache_put<T: Serialize + Send + Sync>(&self, key: &str, value: &T) {
        let write = self.cache.set_json(key, value, self.cache_ttl);
        if let Err(e) = with_timeout(self.cache_timeout, "cache_set", write).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_file_name("empty file name"));
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(AppError::invalid_file_name("invalid file name"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::invalid_file_name("file name is too long"));
    }
    Ok(())
}

fn ensure_readable(file: &File, login: &str) -> AppResult<()> {
    if file.is_readable_by(login) {
        return Ok(());
    }
    info!(login, file_id = %file.id, "Read denied");
    Err(AppError::access_denied("access denied"))
}

/// Backend not-found messages carry the object key, which names the owner.
fn hide_object_key(e: AppError) -> AppError {
    if e.kind == ErrorKind::NotFound {
        AppError::not_found("file not found")
    } else {
        e
    }
}

fn decode_listed(info: &ObjectInfo) -> Option<File> {
    match decode_object(info) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(key = %info.key, error = %e, "Skipping undecodable object");
            None
        }
    }
}
