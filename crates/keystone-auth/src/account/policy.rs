//! Account state gates and the failed-attempt lockout counter.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use keystone_core::config::security::SecurityConfig;
use keystone_core::types::RequestMeta;
use keystone_core::{AuthError, AuthResult};
use keystone_entity::account::{Account, AccountStatus};
use keystone_entity::event::{EventCategory, EventSeverity, SecurityEvent};
use keystone_store::traits::{AccountStore, SecurityEventStore};

/// Applies account-state gates and the failed-login lockout.
pub struct AccountPolicy {
    accounts: Arc<dyn AccountStore>,
    events: Arc<dyn SecurityEventStore>,
    config: SecurityConfig,
}

impl AccountPolicy {
    pub fn new(
        config: SecurityConfig,
        accounts: Arc<dyn AccountStore>,
        events: Arc<dyn SecurityEventStore>,
    ) -> Self {
        Self {
            accounts,
            events,
            config,
        }
    }

    /// Rejects authentication for locked, suspended, or deleted accounts.
    pub fn ensure_can_authenticate(&self, account: &Account) -> AuthResult<()> {
        match account.status {
            AccountStatus::Suspended => return Err(AuthError::AccountSuspended),
            AccountStatus::Deleted => return Err(AuthError::AccountDeleted),
            AccountStatus::Pending | AccountStatus::Active => {}
        }
        if let Some(until) = account.lock_until {
            if Utc::now() < until {
                return Err(AuthError::AccountLocked { until });
            }
        }
        Ok(())
    }

    /// Records a failed login attempt; locks the account when the counter
    /// reaches the configured maximum.
    pub async fn record_failure(&self, account_id: Uuid, meta: &RequestMeta) -> AuthResult<()> {
        let attempts = self.accounts.increment_failed_attempts(account_id).await?;

        self.events
            .append(
                &SecurityEvent::new(
                    Some(account_id),
                    "login_failed",
                    EventCategory::Authentication,
                    EventSeverity::Low,
                )
                .with_context(meta.ip_string(), meta.user_agent.clone(), None)
                .with_data(serde_json::json!({ "failed_attempts": attempts })),
            )
            .await?;

        if attempts >= self.config.max_failed_attempts as i32 {
            let until = Utc::now() + Duration::minutes(self.config.lock_duration_minutes as i64);
            self.accounts.lock_until(account_id, until).await?;
            self.events
                .append(
                    &SecurityEvent::new(
                        Some(account_id),
                        "account_locked",
                        EventCategory::Account,
                        EventSeverity::High,
                    )
                    .with_context(meta.ip_string(), meta.user_agent.clone(), None)
                    .with_data(serde_json::json!({
                        "failed_attempts": attempts,
                        "locked_until": until,
                    })),
                )
                .await?;
            warn!(account_id = %account_id, attempts, %until, "account locked after repeated failures");
        }

        Ok(())
    }

    /// Records a successful login: stamps last-login metadata and clears
    /// the failure counter and any expired lock.
    pub async fn record_success(&self, account_id: Uuid, meta: &RequestMeta) -> AuthResult<()> {
        let now = Utc::now();
        self.accounts
            .record_login(account_id, now, meta.ip_string().as_deref())
            .await?;
        self.accounts.reset_failed_attempts(account_id).await?;
        info!(account_id = %account_id, "login recorded");
        Ok(())
    }
}
