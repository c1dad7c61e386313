//! Password hashing and credential policy.

pub mod hasher;
pub mod validator;

pub use hasher::PasswordHasher;
pub use validator::{CredentialPolicy, CredentialRule, UserDataValidator};
