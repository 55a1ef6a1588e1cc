//! Lockout and automated risk-response configuration.

use serde::{Deserialize, Serialize};

/// Account lockout and risk analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Maximum consecutive failed login attempts before lockout.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: i32,
    /// Account lockout duration in minutes, used both for failed-login
    /// lockout and the high-risk automated response.
    #[serde(default = "default_lock_duration")]
    pub lock_duration_minutes: u64,
    /// How far back the analyzer looks for security events, in days.
    #[serde(default = "default_event_window")]
    pub event_window_days: u64,
    /// Whether automated responses (lock/suspend) are applied at all.
    #[serde(default = "default_true")]
    pub auto_response_enabled: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_failed(),
            lock_duration_minutes: default_lock_duration(),
            event_window_days: default_event_window(),
            auto_response_enabled: true,
        }
    }
}

fn default_max_failed() -> i32 {
    5
}

fn default_lock_duration() -> u64 {
    60
}

fn default_event_window() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
