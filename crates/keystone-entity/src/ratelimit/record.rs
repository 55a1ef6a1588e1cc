//! Rate-limit record and counter key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::limit_type::LimitType;

/// The composite key a rate-limit counter is tracked under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitKey {
    /// What is being limited: an IP, an account key, etc.
    pub identifier: String,
    /// Which operation the counter guards.
    pub limit_type: LimitType,
    /// Scope qualifier (e.g. tenant id, or `"global"`).
    pub scope: String,
}

impl RateLimitKey {
    /// Build a key in the global scope.
    pub fn global(identifier: impl Into<String>, limit_type: LimitType) -> Self {
        Self {
            identifier: identifier.into(),
            limit_type,
            scope: "global".to_string(),
        }
    }

    /// Build a key scoped to a tenant or other namespace.
    pub fn scoped(
        identifier: impl Into<String>,
        limit_type: LimitType,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            limit_type,
            scope: scope.into(),
        }
    }
}

/// A sliding-window attempt counter.
///
/// The window is reset in place, not recreated, when it expires; the
/// attempt count increases monotonically within a window and never
/// exceeds `max_attempts` beyond the bounded concurrency slack at the
/// storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RateLimitRecord {
    /// Row identifier.
    pub id: Uuid,
    /// What is being limited.
    pub identifier: String,
    /// Which operation the counter guards.
    pub limit_type: LimitType,
    /// Scope qualifier.
    pub scope: String,
    /// Start of the current window.
    pub window_start: DateTime<Utc>,
    /// End of the current window; always `window_start + window_seconds`.
    pub window_end: DateTime<Utc>,
    /// Attempts counted in the current window.
    pub attempts: i32,
    /// The attempt cap in force when the window opened.
    pub max_attempts: i32,
    /// When set, attempts are rejected until this time passes. Cleared
    /// only by an explicit reset or window rollover.
    pub blocked_until: Option<DateTime<Utc>>,
    /// Free-form context recorded with the counter.
    pub metadata: Option<serde_json::Value>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last touched.
    pub updated_at: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Whether the record is blocking attempts at `now`.
    pub fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    /// Whether the current window has rolled past `now`.
    pub fn window_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.window_end <= now
    }
}
