//! Token validation: signature, expiry, issuer, and type checking.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use keystone_core::config::token::TokenConfig;
use keystone_core::{AuthError, AuthResult};
use keystone_entity::token::TokenKind;

use super::claims::{AccessClaims, RefreshClaims};

/// A decoded token of either type.
#[derive(Debug, Clone)]
pub enum DecodedClaims {
    /// A decoded access token.
    Access(AccessClaims),
    /// A decoded refresh token.
    Refresh(RefreshClaims),
}

/// Minimal payload used to classify a token before full decoding.
#[derive(Debug, Deserialize)]
struct BareClaims {
    token_type: TokenKind,
}

/// Validates token signatures and decodes typed claims.
#[derive(Clone)]
pub struct TokenDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration (expiry + issuer).
    validation: Validation,
}

impl std::fmt::Debug for TokenDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenDecoder {
    /// Creates a new decoder from token configuration.
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew
        validation.set_issuer(&[&config.issuer]);

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token.
    pub fn decode_access(&self, token: &str) -> AuthResult<AccessClaims> {
        match self.classify(token)? {
            TokenKind::Access => self.decode_typed::<AccessClaims>(token),
            TokenKind::Refresh => Err(AuthError::TokenTypeMismatch),
        }
    }

    /// Decodes and validates a refresh token.
    pub fn decode_refresh(&self, token: &str) -> AuthResult<RefreshClaims> {
        match self.classify(token)? {
            TokenKind::Refresh => self.decode_typed::<RefreshClaims>(token),
            TokenKind::Access => Err(AuthError::TokenTypeMismatch),
        }
    }

    /// Decodes a token of either type.
    pub fn decode_any(&self, token: &str) -> AuthResult<DecodedClaims> {
        match self.classify(token)? {
            TokenKind::Access => self
                .decode_typed::<AccessClaims>(token)
                .map(DecodedClaims::Access),
            TokenKind::Refresh => self
                .decode_typed::<RefreshClaims>(token)
                .map(DecodedClaims::Refresh),
        }
    }

    /// Checks signature, expiry, and issuer, returning the claimed type.
    fn classify(&self, token: &str) -> AuthResult<TokenKind> {
        let data = decode::<BareClaims>(token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;
        Ok(data.claims.token_type)
    }

    /// Full decode into the schema for the already-classified type.
    fn decode_typed<T: serde::de::DeserializeOwned>(&self, token: &str) -> AuthResult<T> {
        let data =
            decode::<T>(token, &self.decoding_key, &self.validation).map_err(map_jwt_error)?;
        Ok(data.claims)
    }
}

/// Maps jsonwebtoken failures onto the error taxonomy.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenMalformed,
    }
}
