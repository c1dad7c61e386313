//! Narrow backend interfaces consumed by the service layer.

pub mod cache;
pub mod storage;

pub use cache::CacheProvider;
pub use storage::{ByteStream, ObjectBackend, ObjectInfo};
