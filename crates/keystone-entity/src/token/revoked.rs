//! Revoked-token record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::TokenKind;

/// An invalidated token, tracked by hash until its natural expiry.
///
/// Presence of a hash means any future use of that exact token must be
/// rejected, even though its signature and expiry would otherwise
/// verify. Rows are purged only after `expires_at` passes; a token whose
/// natural expiry has passed no longer needs revocation tracking.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RevokedToken {
    /// SHA-256 hash of the token string. Globally unique.
    pub token_hash: String,
    /// Which kind of token was revoked.
    pub token_kind: TokenKind,
    /// The account the token was issued for.
    pub account_id: Uuid,
    /// The token's original expiry.
    pub expires_at: DateTime<Utc>,
    /// When the token was revoked.
    pub revoked_at: DateTime<Utc>,
}
