//! Device entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A device known to an account.
///
/// Created on first successful token issuance from a new device and
/// updated on every token use. Devices are never deleted, only blocked.
/// The fingerprint is a labeling heuristic, not a trust boundary: two
/// genuine devices may collide.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Device {
    /// Unique device identifier.
    pub id: Uuid,
    /// The account this device belongs to.
    pub account_id: Uuid,
    /// Best-effort fingerprint derived from the client header or
    /// user-agent grammar.
    pub fingerprint: String,
    /// Parsed device name (e.g. `"iPhone 15"`, `"Firefox"`).
    pub name: Option<String>,
    /// Parsed platform (e.g. `"iOS 17.2"`, `"Windows NT 10.0"`).
    pub platform: Option<String>,
    /// Whether an operator or flow marked this device trusted.
    pub trusted: bool,
    /// SHA-256 hash of the refresh token currently bound to this device.
    pub refresh_token_hash: Option<String>,
    /// Expiry of the bound refresh token.
    pub refresh_expires_at: Option<DateTime<Utc>>,
    /// When the device was blocked (if blocked).
    pub blocked_at: Option<DateTime<Utc>>,
    /// Why the device was blocked.
    pub blocked_reason: Option<String>,
    /// Last time a token from this device was used.
    pub last_seen_at: DateTime<Utc>,
    /// Last source IP seen from this device.
    pub last_ip: Option<String>,
    /// Last raw user-agent seen from this device.
    pub user_agent: Option<String>,
    /// When the device row was created.
    pub created_at: DateTime<Utc>,
}

impl Device {
    /// Check whether the device is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked_at.is_some()
    }
}
