//! File engine: the service plus its filter, fingerprint and cache-aside helpers.

pub mod cache_aside;
pub mod filter;
pub mod fingerprint;
pub mod service;

pub use service::FileService;
