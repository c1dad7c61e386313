//! Route handlers.

pub mod auth;
pub mod docs;
pub mod health;
