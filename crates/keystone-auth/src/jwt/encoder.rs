//! Token creation with configurable signing and TTL.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use keystone_core::config::token::TokenConfig;
use keystone_core::{AuthError, AuthResult};
use keystone_entity::account::Account;
use keystone_entity::token::TokenKind;

use super::claims::{AccessClaims, AccountSnapshot, RefreshClaims};

/// A freshly signed token with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The compact signed token string.
    pub token: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Creates signed access and refresh tokens.
#[derive(Clone)]
pub struct TokenEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Issuer string embedded in every token.
    issuer: String,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
    /// Refresh token TTL in days.
    refresh_ttl_days: i64,
}

impl std::fmt::Debug for TokenEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEncoder")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenEncoder {
    /// Creates a new encoder from token configuration.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_ttl_minutes: config.access_ttl_minutes as i64,
            refresh_ttl_days: config.refresh_ttl_days as i64,
        }
    }

    /// Signs an access token for the given account and session.
    pub fn sign_access(&self, account: &Account, session_id: Uuid) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.access_ttl_minutes);

        let claims = AccessClaims {
            sub: account.id,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            token_type: TokenKind::Access,
            sid: session_id,
            jti: Uuid::new_v4(),
            account: AccountSnapshot::from(account),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Failed to encode access token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Signs a refresh token for the given account and device.
    pub fn sign_refresh(&self, account_id: Uuid, device_id: Uuid) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::days(self.refresh_ttl_days);

        let claims = RefreshClaims {
            sub: account_id,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            token_type: TokenKind::Refresh,
            did: device_id,
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Failed to encode refresh token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}
