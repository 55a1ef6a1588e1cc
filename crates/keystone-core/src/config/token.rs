//! Token signing and rotation configuration.

use serde::{Deserialize, Serialize};

/// Token issuance, verification, and rotation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Secret key for token signing (HMAC-SHA256).
    #[serde(default = "default_secret")]
    pub secret: String,
    /// Issuer string embedded in and required of every token.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_days: u64,
    /// Rotation window: a valid refresh token presented within this many
    /// days of its expiry is replaced and the old one revoked.
    #[serde(default = "default_rotation_window")]
    pub rotation_window_days: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            issuer: default_issuer(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_days: default_refresh_ttl(),
            rotation_window_days: default_rotation_window(),
        }
    }
}

fn default_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "keystone".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    90
}

fn default_rotation_window() -> u64 {
    7
}
