//! # astral-storage
//!
//! Object backend implementations for Astral: an in-memory map for tests
//! and ephemeral deployments, a local filesystem store with JSON metadata
//! sidecars, and S3-compatible object storage behind the `s3` feature.

pub mod manager;
pub mod providers;

pub use manager::StorageManager;
