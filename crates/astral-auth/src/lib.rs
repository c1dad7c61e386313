//! # astral-auth
//!
//! Token-based authorization for Astral.
//!
//! ## Modules
//!
//! - `password` — Argon2id hashing and the credential policy applied at registration
//! - `jwt` — signing and verification of stateless session tokens
//! - `session` — the session store interface with Postgres and in-memory backends
//! - `service` — registration, login, authorization, and session close

pub mod jwt;
pub mod password;
pub mod service;
pub mod session;

pub use jwt::{SessionClaims, SessionTokenCodec};
pub use password::{CredentialPolicy, CredentialRule, PasswordHasher, UserDataValidator};
pub use service::AuthService;
pub use session::{MemorySessionStore, PgSessionStore, SessionStore};
