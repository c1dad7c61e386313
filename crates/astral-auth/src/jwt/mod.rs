//! Stateless session tokens.

pub mod claims;
pub mod codec;

pub use claims::SessionClaims;
pub use codec::SessionTokenCodec;
