//! # astral-entity
//!
//! Domain entity models for Astral. Users and session tokens are table
//! rows and additionally derive `sqlx::FromRow`; files live entirely in
//! object storage and are rebuilt from object metadata.

pub mod file;
pub mod session;
pub mod user;
