//! Object storage configuration.

use serde::{Deserialize, Serialize};

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend type: `"memory"`, `"local"`, or `"s3"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_bytes: u64,
    /// Timeout for stat, list, and delete calls in seconds.
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_seconds: u64,
    /// Timeout for content transfer calls in seconds.
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_seconds: u64,
    /// Local filesystem backend settings.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// S3-compatible backend settings.
    #[serde(default)]
    pub s3: S3StorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            max_upload_size_bytes: default_max_upload_size(),
            metadata_timeout_seconds: default_metadata_timeout(),
            transfer_timeout_seconds: default_transfer_timeout(),
            local: LocalStorageConfig::default(),
            s3: S3StorageConfig::default(),
        }
    }
}

/// Local filesystem backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root directory holding `{owner}/{id}` objects.
    #[serde(default = "default_root_path")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
        }
    }
}

/// S3-compatible (MinIO, AWS) backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// Custom endpoint URL; empty for AWS.
    #[serde(default)]
    pub endpoint: String,
    /// Region name.
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket holding all documents.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Static access key.
    #[serde(default)]
    pub access_key: String,
    /// Static secret key.
    #[serde(default)]
    pub secret_key: String,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            bucket: default_bucket(),
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_max_upload_size() -> u64 {
    100 * 1024 * 1024
}

fn default_metadata_timeout() -> u64 {
    5
}

fn default_transfer_timeout() -> u64 {
    60
}

fn default_root_path() -> String {
    "./data/objects".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "documents".to_string()
}
