//! Backend selection from configuration.

use std::sync::Arc;

use tracing::info;

use astral_core::config::StorageConfig;
use astral_core::error::AppError;
use astral_core::result::AppResult;
use astral_core::traits::storage::ObjectBackend;

/// Builds the object backend named by `storage.provider`.
#[derive(Debug, Clone)]
pub struct StorageManager {
    backend: Arc<dyn ObjectBackend>,
}

impl StorageManager {
    /// Create the configured backend.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let backend: Arc<dyn ObjectBackend> = match config.provider.as_str() {
            "memory" => {
                info!("Initializing in-memory object backend");
                Arc::new(crate::providers::MemoryObjectBackend::new())
            }
            #[cfg(feature = "local")]
            "local" => {
                info!(root = %config.local.root_path, "Initializing local object backend");
                Arc::new(crate::providers::LocalObjectBackend::new(&config.local.root_path).await?)
            }
            #[cfg(feature = "s3")]
            "s3" => {
                info!(bucket = %config.s3.bucket, "Initializing S3 object backend");
                Arc::new(crate::providers::S3ObjectBackend::new(&config.s3).await?)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider: '{other}'. Supported: memory, local, s3"
                )));
            }
        };

        Ok(Self { backend })
    }

    /// Wrap an existing backend (for testing).
    pub fn from_backend(backend: Arc<dyn ObjectBackend>) -> Self {
        Self { backend }
    }

    /// Shared handle to the selected backend.
    pub fn backend(&self) -> Arc<dyn ObjectBackend> {
        Arc::clone(&self.backend)
    }
}
