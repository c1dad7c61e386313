//! # astral-core
//!
//! Core crate for Astral. Contains the narrow backend traits (cache and
//! object storage), configuration schemas, the listing filter type,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Astral crates.

pub mod config;
pub mod error;
pub mod result;
pub mod time;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
