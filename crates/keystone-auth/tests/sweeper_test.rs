//! Maintenance sweep behavior.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use common::{Stores, account, session_for};
use keystone_auth::MaintenanceSweeper;
use keystone_auth::hash::sha256_hex;
use keystone_core::config::rate_limit::{RateLimitConfig, RateLimitRule};
use keystone_core::config::session::SessionConfig;
use keystone_entity::ratelimit::{LimitType, RateLimitKey};
use keystone_entity::session::TerminationReason;
use keystone_entity::token::{RevokedToken, TokenKind};
use keystone_store::traits::{RateLimitStore, RevocationStore, SessionStore};

fn sweeper(stores: &Stores) -> MaintenanceSweeper {
    MaintenanceSweeper::new(
        SessionConfig::default(),
        RateLimitConfig::default(),
        stores.sessions.clone() as Arc<dyn SessionStore>,
        stores.revocations.clone() as Arc<dyn RevocationStore>,
        stores.rate_limits.clone() as Arc<dyn RateLimitStore>,
    )
}

#[tokio::test]
async fn test_expired_sessions_are_terminated() {
    let stores = Stores::new();
    let account = account();

    let live = session_for(account.id, None);
    let mut expired = session_for(account.id, None);
    expired.expires_at = Utc::now() - Duration::hours(1);
    stores.sessions.create(&live).await.unwrap();
    stores.sessions.create(&expired).await.unwrap();

    let report = sweeper(&stores).sweep_once().await.unwrap();
    assert_eq!(report.sessions_expired, 1);

    let swept = stores.sessions.find_by_id(expired.id).await.unwrap().unwrap();
    assert_eq!(swept.terminated_reason, Some(TerminationReason::Expired));
    assert!(
        stores
            .sessions
            .find_by_id(live.id)
            .await
            .unwrap()
            .unwrap()
            .terminated_at
            .is_none()
    );
}

#[tokio::test]
async fn test_terminated_sessions_purged_after_retention() {
    let stores = Stores::new();
    let account = account();

    let mut old = session_for(account.id, None);
    old.terminated_at = Some(Utc::now() - Duration::days(45));
    old.terminated_reason = Some(TerminationReason::LoggedOut);
    let mut recent = session_for(account.id, None);
    recent.terminated_at = Some(Utc::now() - Duration::days(1));
    recent.terminated_reason = Some(TerminationReason::LoggedOut);
    stores.sessions.create(&old).await.unwrap();
    stores.sessions.create(&recent).await.unwrap();

    // Default retention is 30 days.
    let report = sweeper(&stores).sweep_once().await.unwrap();
    assert_eq!(report.sessions_purged, 1);
    assert!(stores.sessions.find_by_id(old.id).await.unwrap().is_none());
    assert!(stores.sessions.find_by_id(recent.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_revocations_purged_after_natural_expiry() {
    let stores = Stores::new();
    let now = Utc::now();

    let expired = RevokedToken {
        token_hash: sha256_hex("old-token"),
        token_kind: TokenKind::Refresh,
        account_id: Uuid::new_v4(),
        expires_at: now - Duration::days(1),
        revoked_at: now - Duration::days(30),
    };
    let live = RevokedToken {
        token_hash: sha256_hex("current-token"),
        token_kind: TokenKind::Refresh,
        account_id: Uuid::new_v4(),
        expires_at: now + Duration::days(30),
        revoked_at: now,
    };
    stores.revocations.revoke(&expired).await.unwrap();
    stores.revocations.revoke(&live).await.unwrap();

    let report = sweeper(&stores).sweep_once().await.unwrap();
    assert_eq!(report.revocations_purged, 1);
    assert!(
        !stores
            .revocations
            .is_revoked(&expired.token_hash)
            .await
            .unwrap()
    );
    // A still-unexpired token stays revoked.
    assert!(stores.revocations.is_revoked(&live.token_hash).await.unwrap());
}

#[tokio::test]
async fn test_stale_rate_limit_rows_purged() {
    let stores = Stores::new();
    let rule = RateLimitRule::new(60, 5);
    let key = RateLimitKey::global("203.0.113.7", LimitType::Login);

    let stale = Utc::now() - Duration::days(10);
    stores.rate_limits.record_attempt(&key, &rule, stale).await.unwrap();

    let report = sweeper(&stores).sweep_once().await.unwrap();
    assert_eq!(report.rate_limits_purged, 1);
}
