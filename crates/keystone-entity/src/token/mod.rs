//! Token type enumeration and the revoked-token record.

pub mod kind;
pub mod revoked;

pub use kind::TokenKind;
pub use revoked::RevokedToken;
