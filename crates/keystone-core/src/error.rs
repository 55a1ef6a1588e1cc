//! Unified authentication error types for Keystone.
//!
//! All crates map their internal errors into [`AuthError`] for consistent
//! propagation through the ? operator. Policy outcomes (rate limit hit,
//! session limit hit, account-state rejections) are ordinary variants so
//! callers can render precise feedback; hard failures are reserved for
//! the store and configuration variants.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The unified error used throughout Keystone.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The presented credentials did not match any account.
    #[error("invalid username or password")]
    InvalidCredential,

    /// The token's expiry has passed.
    #[error("token has expired")]
    TokenExpired,

    /// The token's hash is present in the revocation store.
    #[error("token has been revoked")]
    TokenRevoked,

    /// The token could not be decoded or its signature did not verify.
    #[error("token is malformed")]
    TokenMalformed,

    /// The token decoded but is not of the expected type.
    #[error("unexpected token type")]
    TokenTypeMismatch,

    /// No session exists for the presented identifier.
    #[error("session not found")]
    SessionNotFound,

    /// The session backing the token has been terminated.
    #[error("session has been terminated")]
    SessionTerminated,

    /// The account already has the maximum number of active sessions.
    #[error("maximum of {max_sessions} concurrent sessions reached")]
    SessionLimitExceeded {
        /// The configured per-account session cap.
        max_sessions: u32,
    },

    /// A concurrent caller rotated the refresh token first. Retryable
    /// with a fresh read of the now-current token.
    #[error("concurrent token rotation detected")]
    RotationConflict,

    /// The attempt counter for this key reached its window maximum.
    #[error("rate limited until {blocked_until}")]
    RateLimited {
        /// When the block lifts; callers should surface this as retry-after.
        blocked_until: DateTime<Utc>,
    },

    /// The account is locked out until the given time.
    #[error("account is locked until {until}")]
    AccountLocked {
        /// When the lock expires.
        until: DateTime<Utc>,
    },

    /// The account has been suspended.
    #[error("account is suspended")]
    AccountSuspended,

    /// The account has been soft-deleted.
    #[error("account has been deleted")]
    AccountDeleted,

    /// The device bound to the token has been blocked.
    #[error("device has been blocked")]
    DeviceBlocked,

    /// A storage-layer failure. Never retried inside the core; the
    /// operation reports failure and performs no partial commit.
    #[error("store error: {message}")]
    Store {
        /// A human-readable description of the failed operation.
        message: String,
        /// Optional underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Create a store error without an underlying cause.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store error wrapping an underlying cause.
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the caller may retry the operation with a fresh read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RotationConflict)
    }

    /// Whether this is an expected policy outcome rather than a failure.
    pub fn is_policy_outcome(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::SessionLimitExceeded { .. }
                | Self::AccountLocked { .. }
                | Self::AccountSuspended
                | Self::AccountDeleted
                | Self::DeviceBlocked
        )
    }
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(format!("{err}"))
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::store_with_source(format!("JSON serialization error: {err}"), err)
    }
}
