//! # astral-service
//!
//! The file engine. Orchestrates the object backend and the TTL cache for
//! upload, listing, fetch and delete, and owns the filter and fingerprint
//! rules used at the HTTP boundary.

pub mod context;
pub mod file;

pub use context::RequestContext;
pub use file::FileService;
