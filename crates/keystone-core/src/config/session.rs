//! Session lifecycle and limit configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum concurrent active sessions per account.
    #[serde(default = "default_max_sessions")]
    pub max_sessions_per_user: u32,
    /// Session lifetime in hours from creation.
    #[serde(default = "default_expiry_hours")]
    pub session_expiry_hours: u64,
    /// Hard cap on session lifetime in days, applied over
    /// `session_expiry_hours`.
    #[serde(default = "default_max_expiry_days")]
    pub max_session_expiry_days: u64,
    /// Whether the per-account session cap is enforced at all.
    #[serde(default = "default_true")]
    pub enforce_session_limits: bool,
    /// At the cap: terminate the oldest active session to make room
    /// instead of rejecting the new login.
    #[serde(default = "default_true")]
    pub terminate_oldest_on_limit: bool,
    /// How long terminated sessions are retained before purging, in days.
    #[serde(default = "default_retention_days")]
    pub terminated_retention_days: u64,
    /// Interval for the maintenance sweep in minutes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_user: default_max_sessions(),
            session_expiry_hours: default_expiry_hours(),
            max_session_expiry_days: default_max_expiry_days(),
            enforce_session_limits: true,
            terminate_oldest_on_limit: true,
            terminated_retention_days: default_retention_days(),
            sweep_interval_minutes: default_sweep_interval(),
        }
    }
}

impl SessionConfig {
    /// Effective session lifetime in hours, with the day cap applied.
    pub fn effective_expiry_hours(&self) -> u64 {
        self.session_expiry_hours
            .min(self.max_session_expiry_days * 24)
    }
}

fn default_max_sessions() -> u32 {
    5
}

fn default_expiry_hours() -> u64 {
    24
}

fn default_max_expiry_days() -> u64 {
    30
}

fn default_retention_days() -> u64 {
    30
}

fn default_sweep_interval() -> u64 {
    15
}

fn default_true() -> bool {
    true
}
