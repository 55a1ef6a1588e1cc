//! Sliding-window rate limiting configuration.

use serde::{Deserialize, Serialize};

/// A single rate-limit rule: window length, attempt cap, and an optional
/// cool-down applied when the cap is hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitRule {
    /// Length of the counting window in seconds.
    pub window_seconds: u64,
    /// Maximum attempts allowed within one window.
    pub max_attempts: u32,
    /// Optional block duration in seconds once the cap is hit. When
    /// absent the block lasts until the window ends.
    #[serde(default)]
    pub block_seconds: Option<u64>,
}

impl RateLimitRule {
    /// Shorthand constructor for a window-bounded rule.
    pub fn new(window_seconds: u64, max_attempts: u32) -> Self {
        Self {
            window_seconds,
            max_attempts,
            block_seconds: None,
        }
    }
}

/// Per-limit-type rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Login attempts per identifier.
    #[serde(default = "default_login")]
    pub login: RateLimitRule,
    /// Token refresh attempts per identifier.
    #[serde(default = "default_refresh")]
    pub refresh: RateLimitRule,
    /// Password reset requests per identifier.
    #[serde(default = "default_password_reset")]
    pub password_reset: RateLimitRule,
    /// OTP delivery requests per identifier.
    #[serde(default = "default_otp_request")]
    pub otp_request: RateLimitRule,
    /// Other sensitive operations per identifier.
    #[serde(default = "default_sensitive_action")]
    pub sensitive_action: RateLimitRule,
    /// How long stale records are retained before purging, in days.
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login: default_login(),
            refresh: default_refresh(),
            password_reset: default_password_reset(),
            otp_request: default_otp_request(),
            sensitive_action: default_sensitive_action(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_login() -> RateLimitRule {
    RateLimitRule::new(60, 5)
}

fn default_refresh() -> RateLimitRule {
    RateLimitRule::new(60, 10)
}

fn default_password_reset() -> RateLimitRule {
    RateLimitRule {
        window_seconds: 3600,
        max_attempts: 3,
        block_seconds: Some(7200),
    }
}

fn default_otp_request() -> RateLimitRule {
    RateLimitRule::new(600, 5)
}

fn default_sensitive_action() -> RateLimitRule {
    RateLimitRule::new(300, 10)
}

fn default_retention_days() -> u64 {
    7
}
