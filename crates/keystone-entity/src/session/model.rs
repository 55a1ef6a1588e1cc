//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::termination::TerminationReason;

/// A server-side session anchoring an access/refresh token pair.
///
/// Sessions move through exactly one transition, `Active → Terminated`,
/// and are never resurrected. Terminated sessions are kept until the
/// retention window passes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The account this session belongs to.
    pub account_id: Uuid,
    /// The device this session was created from, when known.
    pub device_id: Option<Uuid>,
    /// SHA-256 hash of the access token issued at login.
    pub access_token_hash: String,
    /// SHA-256 hash of the refresh token currently tied to this session.
    pub refresh_token_hash: Option<String>,
    /// Source IP at creation.
    pub ip_address: Option<String>,
    /// User-agent at creation.
    pub user_agent: Option<String>,
    /// When the session was created (login time).
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub last_activity: DateTime<Utc>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
    /// When the session was terminated.
    pub terminated_at: Option<DateTime<Utc>>,
    /// Why the session was terminated.
    pub terminated_reason: Option<TerminationReason>,
}

impl Session {
    /// Check whether the session is still active (not terminated and not expired).
    pub fn is_active(&self) -> bool {
        self.terminated_at.is_none() && self.expires_at > Utc::now()
    }

    /// Check whether the session has been terminated.
    pub fn is_terminated(&self) -> bool {
        self.terminated_at.is_some()
    }

    /// Check whether the session's expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
