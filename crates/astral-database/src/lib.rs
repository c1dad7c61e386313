//! # astral-database
//!
//! PostgreSQL connection management, migrations, and the user and token
//! repositories backing the session store.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
