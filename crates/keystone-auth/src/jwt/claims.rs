//! Fixed claim schemas per token type.
//!
//! Access and refresh tokens carry distinct, validated payloads rather
//! than one loosely-typed claim set: an access token is anchored to a
//! session, a refresh token to a device.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use keystone_entity::account::Account;
use keystone_entity::token::TokenKind;

/// Denormalized account data embedded in every access token so that
/// API handlers can render identity without a store round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// Whether the phone number has been verified.
    pub phone_verified: bool,
    /// Avatar image reference.
    pub avatar_url: Option<String>,
    /// Plan tier label.
    pub plan: String,
}

impl From<&Account> for AccountSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            email_verified: account.email_verified,
            phone_verified: account.phone_verified,
            avatar_url: account.avatar_url.clone(),
            plan: account.plan.clone(),
        }
    }
}

/// Claims payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject — the account ID.
    pub sub: Uuid,
    /// Issuer string.
    pub iss: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Always [`TokenKind::Access`].
    pub token_type: TokenKind,
    /// Session this token belongs to.
    pub sid: Uuid,
    /// Token ID.
    pub jti: Uuid,
    /// Account snapshot at issuance time.
    pub account: AccountSnapshot,
}

/// Claims payload of a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject — the account ID.
    pub sub: Uuid,
    /// Issuer string.
    pub iss: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Always [`TokenKind::Refresh`].
    pub token_type: TokenKind,
    /// Device this token is bound to.
    pub did: Uuid,
    /// Token ID.
    pub jti: Uuid,
}

impl AccessClaims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

impl RefreshClaims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}
