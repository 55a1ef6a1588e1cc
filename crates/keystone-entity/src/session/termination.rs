//! Session termination reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a session left the `Active` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "termination_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The user logged out explicitly.
    LoggedOut,
    /// Evicted to make room under the per-account session cap.
    LimitExceeded,
    /// The session's expiry passed.
    Expired,
    /// Terminated because the account was locked.
    AccountLocked,
    /// Terminated because the account was suspended.
    AccountSuspended,
    /// Terminated because the account was deleted.
    AccountDeleted,
    /// Terminated by an operator.
    AdminAction,
}

impl TerminationReason {
    /// Return the reason as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoggedOut => "logged_out",
            Self::LimitExceeded => "limit_exceeded",
            Self::Expired => "expired",
            Self::AccountLocked => "account_locked",
            Self::AccountSuspended => "account_suspended",
            Self::AccountDeleted => "account_deleted",
            Self::AdminAction => "admin_action",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
