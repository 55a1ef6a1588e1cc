//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::AccountStatus;

/// A registered account in the Keystone service.
///
/// Keystone reads account identity and mutates the security-relevant
/// columns only: the failed-attempt counter, the lock-until timestamp,
/// the status, and the last-login metadata.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Unique account identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// Whether the phone number has been verified.
    pub phone_verified: bool,
    /// Avatar image reference.
    pub avatar_url: Option<String>,
    /// Plan tier label (e.g. `"free"`, `"pro"`).
    pub plan: String,
    /// Account lifecycle status.
    pub status: AccountStatus,
    /// Number of consecutive failed login attempts.
    pub failed_login_attempts: i32,
    /// Account locked until this time (if locked).
    pub lock_until: Option<DateTime<Utc>>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Source IP of the last successful login.
    pub last_login_ip: Option<String>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Check whether the account is currently locked out.
    pub fn is_locked(&self) -> bool {
        self.lock_until.is_some_and(|until| Utc::now() < until)
    }

    /// Days since the last successful login, if any.
    pub fn days_since_last_login(&self) -> Option<i64> {
        self.last_login_at
            .map(|at| (Utc::now() - at).num_days().max(0))
    }
}
