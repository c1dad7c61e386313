//! S3-compatible object backend (AWS S3, MinIO).

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, error, info};

use astral_core::config::S3StorageConfig;
use astral_core::error::{AppError, ErrorKind};
use astral_core::result::AppResult;
use astral_core::traits::storage::{
    ByteStream, ObjectBackend, ObjectInfo, bytes_stream, collect_bytes,
};

/// Concurrent `HeadObject` calls while listing.
const LIST_STAT_CONCURRENCY: usize = 8;

/// S3-backed object storage. All documents share one bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectBackend {
    client: Client,
    bucket: String,
}

fn s3_failed<E>(context: String, e: E) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    error!(error = %e, "{context}");
    AppError::with_source(ErrorKind::Internal, context, e)
}

fn to_utc(ts: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    ts.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or_else(Utc::now)
}

impl S3ObjectBackend {
    /// Connect using static credentials and an optional custom endpoint.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "astral-static",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if !config.endpoint.is_empty() {
            loader = loader.endpoint_url(config.endpoint.clone());
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        info!(bucket = %config.bucket, endpoint = %config.endpoint, "S3 client initialized");
        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }

    async fn list_keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| s3_failed(format!("Failed to list prefix: {prefix}"), e))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }
        Ok(keys)
    }
}

#[async_trait]
impl ObjectBackend for S3ObjectBackend {
    fn backend_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        metadata: &HashMap<String, String>,
        content: ByteStream,
        size_bytes: u64,
    ) -> AppResult<ObjectInfo> {
        let body = collect_bytes(content).await?;
        if body.len() as u64 != size_bytes {
            debug!(
                key,
                declared = size_bytes,
                actual = body.len(),
                "Declared size differs from body"
            );
        }

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(body.len() as i64)
            .set_metadata(Some(metadata.clone()))
            .body(aws_sdk_s3::primitives::ByteStream::from(body))
            .send()
            .await
            .map_err(|e| s3_failed(format!("Failed to upload object: {key}"), e))?;

        debug!(key, "Uploaded object to S3");
        self.stat_object(key).await
    }

    async fn get_object(&self, key: &str) -> AppResult<ByteStream> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::not_found(format!("object not found: {key}"))
                } else {
                    s3_failed(format!("Failed to download object: {key}"), service_error)
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| s3_failed(format!("Failed to read object body: {key}"), e))?;
        Ok(bytes_stream(data.into_bytes()))
    }

    async fn stat_object(&self, key: &str) -> AppResult<ObjectInfo> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    AppError::not_found(format!("object not found: {key}"))
                } else {
                    s3_failed(format!("Failed to stat object: {key}"), service_error)
                }
            })?;

        Ok(ObjectInfo {
            key: key.to_string(),
            size_bytes: head.content_length().unwrap_or(0).max(0) as u64,
            content_type: head.content_type().unwrap_or_default().to_string(),
            last_modified: to_utc(head.last_modified()),
            metadata: head.metadata().cloned().unwrap_or_default(),
        })
    }

    async fn delete_object(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_failed(format!("Failed to delete object: {key}"), e))?;
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> AppResult<Vec<ObjectInfo>> {
        // Listing does not return user metadata, so each key is stat'ed.
        let keys = self.list_keys(prefix).await?;
        stream::iter(keys)
            .map(|key| async move { self.stat_object(&key).await })
            .buffer_unordered(LIST_STAT_CONCURRENCY)
            .try_collect()
            .await
    }

    async fn find_object(&self, object_id: &str) -> AppResult<Option<ObjectInfo>> {
        let suffix = format!("/{object_id}");
        let key = self
            .list_keys("")
            .await?
            .into_iter()
            .find(|key| key.ends_with(&suffix));

        match key {
            Some(key) => self.stat_object(&key).await.map(Some),
            None => Ok(None),
        }
    }
}
