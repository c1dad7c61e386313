//! Session store: users and the revocable list of issued tokens.

pub mod memory;
pub mod store;

pub use memory::MemorySessionStore;
pub use store::{PgSessionStore, SessionStore};
