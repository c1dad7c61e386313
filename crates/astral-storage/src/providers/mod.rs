//! Object backend implementations.

#[cfg(feature = "local")]
pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

#[cfg(feature = "local")]
pub use local::LocalObjectBackend;
pub use memory::MemoryObjectBackend;
#[cfg(feature = "s3")]
pub use s3::S3ObjectBackend;
