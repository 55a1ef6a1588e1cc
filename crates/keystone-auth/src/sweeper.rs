//! Background maintenance: expiring sessions, purging revocations past
//! their natural expiry, and trimming stale rate-limit rows.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use keystone_core::config::rate_limit::RateLimitConfig;
use keystone_core::config::session::SessionConfig;
use keystone_core::AuthResult;
use keystone_entity::session::TerminationReason;
use keystone_store::traits::{RateLimitStore, RevocationStore, SessionStore};

/// What one sweep pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions whose expiry passed and were terminated.
    pub sessions_expired: u64,
    /// Terminated sessions purged past retention.
    pub sessions_purged: u64,
    /// Revocation rows purged past their token's natural expiry.
    pub revocations_purged: u64,
    /// Rate-limit rows purged past retention.
    pub rate_limits_purged: u64,
}

/// Periodic cleanup over the session, revocation, and rate-limit stores.
pub struct MaintenanceSweeper {
    sessions: Arc<dyn SessionStore>,
    revocations: Arc<dyn RevocationStore>,
    rate_limits: Arc<dyn RateLimitStore>,
    session_config: SessionConfig,
    rate_limit_config: RateLimitConfig,
}

impl MaintenanceSweeper {
    pub fn new(
        session_config: SessionConfig,
        rate_limit_config: RateLimitConfig,
        sessions: Arc<dyn SessionStore>,
        revocations: Arc<dyn RevocationStore>,
        rate_limits: Arc<dyn RateLimitStore>,
    ) -> Self {
        Self {
            sessions,
            revocations,
            rate_limits,
            session_config,
            rate_limit_config,
        }
    }

    /// One full sweep pass.
    pub async fn sweep_once(&self) -> AuthResult<SweepReport> {
        let now = Utc::now();
        let mut report = SweepReport::default();

        for session in self.sessions.find_expired(now).await? {
            if self
                .sessions
                .terminate(session.id, TerminationReason::Expired, now)
                .await?
            {
                report.sessions_expired += 1;
            }
        }

        let retention =
            now - Duration::days(self.session_config.terminated_retention_days as i64);
        report.sessions_purged = self.sessions.purge_terminated_before(retention).await?;

        report.revocations_purged = self.revocations.purge_expired(now).await?;

        let rate_cutoff = now - Duration::days(self.rate_limit_config.retention_days as i64);
        report.rate_limits_purged = self.rate_limits.purge_older_than(rate_cutoff).await?;

        if report != SweepReport::default() {
            info!(
                sessions_expired = report.sessions_expired,
                sessions_purged = report.sessions_purged,
                revocations_purged = report.revocations_purged,
                rate_limits_purged = report.rate_limits_purged,
                "maintenance sweep complete"
            );
        }
        Ok(report)
    }

    /// Spawns the sweep loop on the configured interval.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let interval = StdDuration::from_secs(self.session_config.sweep_interval_minutes * 60);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(err) = self.sweep_once().await {
                    error!(%err, "maintenance sweep failed");
                }
            }
        })
    }
}
