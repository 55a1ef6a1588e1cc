//! Security event severity and category enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a security event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "event_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    /// Informational.
    Low,
    /// Noteworthy but routine.
    Medium,
    /// Requires attention.
    High,
    /// Requires immediate action.
    Critical,
}

impl EventSeverity {
    /// Risk weight contributed by one event of this severity.
    ///
    /// Weights are strictly increasing with severity so that the
    /// analyzer's event score is monotonic in both count and severity.
    pub fn risk_weight(&self) -> f64 {
        match self {
            Self::Low => 0.05,
            Self::Medium => 0.15,
            Self::High => 0.35,
            Self::Critical => 0.60,
        }
    }

    /// Return the severity as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for EventSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Broad category of a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Login, logout, token events.
    Authentication,
    /// Status, lock, and profile-level account events.
    Account,
    /// Device registration and blocking.
    Device,
    /// Rate-limit blocks.
    RateLimit,
    /// Risk analyzer outcomes.
    Risk,
}

impl EventCategory {
    /// Return the category as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Account => "account",
            Self::Device => "device",
            Self::RateLimit => "rate_limit",
            Self::Risk => "risk",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_increase_with_severity() {
        assert!(EventSeverity::Low.risk_weight() < EventSeverity::Medium.risk_weight());
        assert!(EventSeverity::Medium.risk_weight() < EventSeverity::High.risk_weight());
        assert!(EventSeverity::High.risk_weight() < EventSeverity::Critical.risk_weight());
    }
}
