//! Access/refresh token issuance, verification, rotation, and revocation.

pub mod issuer;

pub use issuer::{RefreshIssue, TokenIssuer, VerifiedClaims};
