//! The rate limiter.
//!
//! The attempt counter itself lives in the store as a single atomic
//! read-modify-write, so two concurrent attempts for the same key can
//! never both slip past the cap. This layer picks the rule for the limit
//! type and turns the post-update record into an allow/block decision.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use keystone_core::config::rate_limit::{RateLimitConfig, RateLimitRule};
use keystone_core::{AuthError, AuthResult};
use keystone_entity::event::{EventCategory, EventSeverity, SecurityEvent};
use keystone_entity::ratelimit::{LimitType, RateLimitKey};
use keystone_store::traits::{RateLimitStore, SecurityEventStore};

/// The outcome of recording one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The attempt was counted and may proceed.
    Allowed {
        /// Attempts used in the current window, including this one.
        attempts: u32,
        /// Attempts left before the cap.
        remaining: u32,
    },
    /// The cap was reached; the attempt was rejected.
    Blocked {
        /// When the block lifts.
        blocked_until: DateTime<Utc>,
    },
}

/// Sliding-window attempt throttle keyed by (identifier, type, scope).
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    events: Arc<dyn SecurityEventStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(
        config: RateLimitConfig,
        store: Arc<dyn RateLimitStore>,
        events: Arc<dyn SecurityEventStore>,
    ) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// The configured rule for a limit type.
    pub fn rule_for(&self, limit_type: LimitType) -> RateLimitRule {
        match limit_type {
            LimitType::Login => self.config.login,
            LimitType::Refresh => self.config.refresh,
            LimitType::PasswordReset => self.config.password_reset,
            LimitType::OtpRequest => self.config.otp_request,
            LimitType::SensitiveAction => self.config.sensitive_action,
        }
    }

    /// Records one attempt and returns the decision.
    pub async fn record_attempt(&self, key: &RateLimitKey) -> AuthResult<RateLimitDecision> {
        let rule = self.rule_for(key.limit_type);
        let now = Utc::now();
        let record = self.store.record_attempt(key, &rule, now).await?;

        if let Some(blocked_until) = record.blocked_until {
            if now < blocked_until {
                self.events
                    .append(
                        &SecurityEvent::new(
                            None,
                            "rate_limit_hit",
                            EventCategory::RateLimit,
                            EventSeverity::Medium,
                        )
                        .with_data(serde_json::json!({
                            "identifier": key.identifier,
                            "limit_type": key.limit_type,
                            "scope": key.scope,
                            "blocked_until": blocked_until,
                        })),
                    )
                    .await?;
                warn!(
                    identifier = %key.identifier,
                    limit_type = ?key.limit_type,
                    %blocked_until,
                    "rate limit hit"
                );
                return Ok(RateLimitDecision::Blocked { blocked_until });
            }
        }

        let attempts = record.attempts.max(0) as u32;
        debug!(
            identifier = %key.identifier,
            limit_type = ?key.limit_type,
            attempts,
            "attempt counted"
        );
        Ok(RateLimitDecision::Allowed {
            attempts,
            remaining: (record.max_attempts.max(0) as u32).saturating_sub(attempts),
        })
    }

    /// Records one attempt, mapping a block to [`AuthError::RateLimited`]
    /// so guard-style callers can use `?`.
    pub async fn check_rate_limit(&self, key: &RateLimitKey) -> AuthResult<u32> {
        match self.record_attempt(key).await? {
            RateLimitDecision::Allowed { attempts, .. } => Ok(attempts),
            RateLimitDecision::Blocked { blocked_until } => {
                Err(AuthError::RateLimited { blocked_until })
            }
        }
    }

    /// Whether the key is currently blocked, without counting an attempt.
    pub async fn is_blocked(&self, key: &RateLimitKey) -> AuthResult<bool> {
        let now = Utc::now();
        Ok(self
            .store
            .find(key)
            .await?
            .is_some_and(|record| record.is_blocked_at(now)))
    }

    /// Attempts counted in the key's current window.
    pub async fn attempt_count(&self, key: &RateLimitKey) -> AuthResult<u32> {
        let now = Utc::now();
        Ok(self
            .store
            .find(key)
            .await?
            .filter(|record| !record.window_expired_at(now))
            .map(|record| record.attempts.max(0) as u32)
            .unwrap_or(0))
    }

    /// Manually resets a key's window and block, e.g. after a successful
    /// verification.
    pub async fn reset_window(&self, key: &RateLimitKey) -> AuthResult<()> {
        self.store.reset(key).await
    }

    /// Deletes records untouched for the configured retention period.
    pub async fn cleanup_old_records(&self) -> AuthResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(self.config.retention_days as i64);
        self.store.purge_older_than(cutoff).await
    }
}
