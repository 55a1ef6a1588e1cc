//! Token encoding, decoding, and claim schemas.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::{AccessClaims, AccountSnapshot, RefreshClaims};
pub use decoder::{DecodedClaims, TokenDecoder};
pub use encoder::{IssuedToken, TokenEncoder};
