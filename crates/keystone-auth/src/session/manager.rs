//! The session manager.
//!
//! Sessions move `Active → Terminated` and nothing else. Limit
//! enforcement is check-then-act: two logins for the same account in the
//! same instant can both pass the count and briefly overshoot the cap by
//! one. A hard cap would need a count-bounded constraint in the store;
//! the overshoot is accepted instead.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use keystone_core::config::session::SessionConfig;
use keystone_core::types::RequestMeta;
use keystone_core::{AuthError, AuthResult};
use keystone_entity::account::Account;
use keystone_entity::device::Device;
use keystone_entity::event::{EventCategory, EventSeverity, SecurityEvent};
use keystone_entity::session::{Session, TerminationReason};
use keystone_store::traits::{SecurityEventStore, SessionStore};

/// How the session limit was resolved for a new login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitOutcome {
    /// The account was under its cap.
    UnderLimit,
    /// The cap was reached and the oldest session was terminated to make
    /// room.
    EvictedOldest(Uuid),
}

/// Token hashes for a session being created. The caller signs the
/// tokens against a pre-generated session ID, then hands the hashes
/// here so the row is complete from the start.
#[derive(Debug, Clone, Copy)]
pub struct NewSession<'a> {
    /// Pre-generated session identifier, already embedded in the
    /// access token's claims.
    pub id: Uuid,
    /// SHA-256 hash of the issued access token.
    pub access_token_hash: &'a str,
    /// SHA-256 hash of the issued refresh token, if one was issued.
    pub refresh_token_hash: Option<&'a str>,
}

/// Owns the session lifecycle and the per-account session cap.
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    events: Arc<dyn SecurityEventStore>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        sessions: Arc<dyn SessionStore>,
        events: Arc<dyn SecurityEventStore>,
    ) -> Self {
        Self {
            sessions,
            events,
            config,
        }
    }

    /// Creates an Active session after applying the session-limit policy.
    pub async fn create_session(
        &self,
        account: &Account,
        device: Option<&Device>,
        draft: NewSession<'_>,
        meta: &RequestMeta,
    ) -> AuthResult<(Session, LimitOutcome)> {
        let outcome = self.enforce_session_limits(account.id).await?;

        let now = Utc::now();
        let session = Session {
            id: draft.id,
            account_id: account.id,
            device_id: device.map(|d| d.id),
            access_token_hash: draft.access_token_hash.to_string(),
            refresh_token_hash: draft.refresh_token_hash.map(str::to_string),
            ip_address: meta.ip_string(),
            user_agent: meta.user_agent.clone(),
            created_at: now,
            last_activity: now,
            expires_at: now + Duration::hours(self.config.effective_expiry_hours() as i64),
            terminated_at: None,
            terminated_reason: None,
        };
        self.sessions.create(&session).await?;

        info!(
            account_id = %account.id,
            session_id = %session.id,
            evicted = matches!(outcome, LimitOutcome::EvictedOldest(_)),
            "session created"
        );
        Ok((session, outcome))
    }

    /// Applies the per-account session cap ahead of a new login.
    ///
    /// At the cap, either the oldest active session is terminated with
    /// reason `LimitExceeded` or the login is rejected with
    /// [`AuthError::SessionLimitExceeded`], per configuration.
    pub async fn enforce_session_limits(&self, account_id: Uuid) -> AuthResult<LimitOutcome> {
        if !self.config.enforce_session_limits {
            return Ok(LimitOutcome::UnderLimit);
        }

        let now = Utc::now();
        let active = self.sessions.count_active(account_id, now).await?;
        if active < self.config.max_sessions_per_user as i64 {
            return Ok(LimitOutcome::UnderLimit);
        }

        if !self.config.terminate_oldest_on_limit {
            return Err(AuthError::SessionLimitExceeded {
                max_sessions: self.config.max_sessions_per_user,
            });
        }

        let Some(oldest) = self.sessions.find_oldest_active(account_id, now).await? else {
            // The count raced with terminations; nothing left to evict.
            return Ok(LimitOutcome::UnderLimit);
        };

        self.sessions
            .terminate(oldest.id, TerminationReason::LimitExceeded, now)
            .await?;
        self.events
            .append(
                &SecurityEvent::new(
                    Some(account_id),
                    "session_limit_evicted",
                    EventCategory::Authentication,
                    EventSeverity::Low,
                )
                .with_context(oldest.ip_address.clone(), oldest.user_agent.clone(), Some(oldest.id)),
            )
            .await?;

        debug!(account_id = %account_id, evicted = %oldest.id, "session cap reached, evicted oldest");
        Ok(LimitOutcome::EvictedOldest(oldest.id))
    }

    /// Terminates a session. Idempotent: terminating an already
    /// terminated session is a no-op returning `false`.
    pub async fn terminate_session(
        &self,
        session_id: Uuid,
        reason: TerminationReason,
    ) -> AuthResult<bool> {
        let transitioned = self
            .sessions
            .terminate(session_id, reason, Utc::now())
            .await?;
        if transitioned {
            info!(session_id = %session_id, ?reason, "session terminated");
        }
        Ok(transitioned)
    }

    /// Terminates every active session for the account. Used by the
    /// suspend/delete flows. Returns how many sessions transitioned.
    pub async fn terminate_all_user_sessions(
        &self,
        account_id: Uuid,
        reason: TerminationReason,
    ) -> AuthResult<u64> {
        let count = self
            .sessions
            .terminate_all_for_account(account_id, reason, Utc::now())
            .await?;
        if count > 0 {
            info!(account_id = %account_id, count, ?reason, "terminated all sessions");
        }
        Ok(count)
    }

    /// Confirms the session backing a presented token is still Active and
    /// belongs to the claimed account.
    ///
    /// A missing session is [`AuthError::SessionNotFound`]; a terminated
    /// or expired one is [`AuthError::SessionTerminated`].
    pub async fn find_session_with_account(
        &self,
        session_id: Uuid,
        account_id: Uuid,
    ) -> AuthResult<Session> {
        let session = self
            .sessions
            .find_for_account(session_id, account_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;
        if !session.is_active() {
            return Err(AuthError::SessionTerminated);
        }
        Ok(session)
    }

    /// Stamps last-activity on a live session.
    pub async fn touch_activity(&self, session_id: Uuid) -> AuthResult<()> {
        self.sessions.touch_activity(session_id, Utc::now()).await
    }

    /// Lists the account's active sessions, for display to the user.
    pub async fn list_active_sessions(&self, account_id: Uuid) -> AuthResult<Vec<Session>> {
        self.sessions
            .find_active_for_account(account_id, Utc::now())
            .await
    }
}
