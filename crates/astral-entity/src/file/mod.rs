//! File entities and their object-metadata encoding.

pub mod metadata;
pub mod model;
pub mod upload;

pub use model::{CachedFile, File, StoredFile};
pub use upload::NewFile;
