//! Rate-limit type enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which sensitive operation a rate-limit counter guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "limit_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LimitType {
    /// Login attempts.
    Login,
    /// Token refresh attempts.
    Refresh,
    /// Password reset requests.
    PasswordReset,
    /// OTP delivery requests.
    OtpRequest,
    /// Other sensitive operations.
    SensitiveAction,
}

impl LimitType {
    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Refresh => "refresh",
            Self::PasswordReset => "password_reset",
            Self::OtpRequest => "otp_request",
            Self::SensitiveAction => "sensitive_action",
        }
    }
}

impl fmt::Display for LimitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
