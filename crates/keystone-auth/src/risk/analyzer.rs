//! Deterministic risk scoring from login-failure, activity-recency, and
//! security-event signals.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use keystone_core::config::security::SecurityConfig;
use keystone_core::{AuthError, AuthResult};
use keystone_entity::account::{Account, AccountStatus};
use keystone_entity::event::{EventCategory, EventSeverity, SecurityEvent};
use keystone_entity::session::TerminationReason;
use keystone_store::traits::{AccountStore, SecurityEventStore};

use crate::session::SessionManager;

/// Discrete risk level derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Maps a normalized score onto a level.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// The computed risk picture for an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// The assessed account.
    pub account_id: Uuid,
    /// Risk from consecutive failed logins, in `[0, 1]`.
    pub failed_login_risk: f64,
    /// Risk from login recency, in `[0, 1]`.
    pub activity_risk: f64,
    /// Risk from recent security events, in `[0, 1]`.
    pub security_event_risk: f64,
    /// Arithmetic mean of the three components.
    pub score: f64,
    /// Discrete level for the score.
    pub level: RiskLevel,
    /// Human-readable follow-ups for medium/low findings.
    pub recommendations: Vec<String>,
}

/// What the automated response did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    /// No forced action.
    None,
    /// Account locked until the contained time.
    Locked(chrono::DateTime<Utc>),
    /// Account suspended and all sessions terminated.
    Suspended,
}

/// Scores account risk and drives lock/suspend responses.
pub struct SecurityRiskAnalyzer {
    accounts: Arc<dyn AccountStore>,
    events: Arc<dyn SecurityEventStore>,
    sessions: Arc<SessionManager>,
    config: SecurityConfig,
}

impl SecurityRiskAnalyzer {
    pub fn new(
        config: SecurityConfig,
        accounts: Arc<dyn AccountStore>,
        events: Arc<dyn SecurityEventStore>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            accounts,
            events,
            sessions,
            config,
        }
    }

    /// Loads the account and its recent events, then scores them.
    pub async fn analyze_security(&self, account_id: Uuid) -> AuthResult<RiskAssessment> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AuthError::store("account not found"))?;
        let since = Utc::now() - Duration::days(self.config.event_window_days as i64);
        let events = self.events.recent_for_account(account_id, since).await?;
        Ok(Self::assess(&account, &events))
    }

    /// Pure scoring over an account and its recent events.
    pub fn assess(account: &Account, events: &[SecurityEvent]) -> RiskAssessment {
        let failed_login_risk = failed_login_risk(account.failed_login_attempts);
        let activity_risk = activity_risk(account.days_since_last_login());
        let security_event_risk = security_event_risk(events);
        let score = (failed_login_risk + activity_risk + security_event_risk) / 3.0;
        let level = RiskLevel::from_score(score);

        let mut recommendations = Vec::new();
        if failed_login_risk >= 0.4 {
            recommendations.push("review recent failed login attempts".to_string());
        }
        if activity_risk >= 0.4 {
            recommendations.push("account dormant; consider re-verification".to_string());
        }
        if security_event_risk >= 0.4 {
            recommendations.push("inspect recent security events".to_string());
        }

        RiskAssessment {
            account_id: account.id,
            failed_login_risk,
            activity_risk,
            security_event_risk,
            score,
            level,
            recommendations,
        }
    }

    /// Scores the account and applies the automated response policy:
    /// critical → suspend and terminate all sessions; high → lock for the
    /// configured duration; medium/low → recommendations only.
    pub async fn automated_response(
        &self,
        account_id: Uuid,
    ) -> AuthResult<(RiskAssessment, ResponseAction)> {
        let assessment = self.analyze_security(account_id).await?;

        if !self.config.auto_response_enabled {
            return Ok((assessment, ResponseAction::None));
        }

        let action = match assessment.level {
            RiskLevel::Critical => {
                let now = Utc::now();
                self.accounts
                    .set_status(account_id, AccountStatus::Suspended, now)
                    .await?;
                self.sessions
                    .terminate_all_user_sessions(account_id, TerminationReason::AccountSuspended)
                    .await?;
                self.events
                    .append(
                        &SecurityEvent::new(
                            Some(account_id),
                            "account_suspended",
                            EventCategory::Risk,
                            EventSeverity::Critical,
                        )
                        .with_data(serde_json::json!({ "score": assessment.score })),
                    )
                    .await?;
                warn!(account_id = %account_id, score = assessment.score, "critical risk, account suspended");
                ResponseAction::Suspended
            }
            RiskLevel::High => {
                let until = Utc::now() + Duration::minutes(self.config.lock_duration_minutes as i64);
                self.accounts.lock_until(account_id, until).await?;
                self.events
                    .append(
                        &SecurityEvent::new(
                            Some(account_id),
                            "account_locked",
                            EventCategory::Risk,
                            EventSeverity::High,
                        )
                        .with_data(serde_json::json!({
                            "score": assessment.score,
                            "locked_until": until,
                        })),
                    )
                    .await?;
                warn!(account_id = %account_id, score = assessment.score, %until, "high risk, account locked");
                ResponseAction::Locked(until)
            }
            RiskLevel::Medium | RiskLevel::Low => {
                info!(account_id = %account_id, score = assessment.score, level = ?assessment.level, "no forced action");
                ResponseAction::None
            }
        };

        Ok((assessment, action))
    }
}

fn failed_login_risk(attempts: i32) -> f64 {
    match attempts {
        a if a >= 10 => 1.0,
        a if a >= 7 => 0.8,
        a if a >= 5 => 0.6,
        a if a >= 3 => 0.4,
        _ => 0.1,
    }
}

fn activity_risk(days_since_last_login: Option<i64>) -> f64 {
    match days_since_last_login {
        None => 0.3,
        Some(d) if d > 365 => 0.8,
        Some(d) if d > 90 => 0.6,
        Some(d) if d > 30 => 0.4,
        Some(_) => 0.1,
    }
}

/// Sum of severity weights over the recent events, saturating at 1.0.
/// Monotonic in both event count and severity.
fn security_event_risk(events: &[SecurityEvent]) -> f64 {
    events
        .iter()
        .map(|e| e.severity.risk_weight())
        .sum::<f64>()
        .min(1.0)
}
