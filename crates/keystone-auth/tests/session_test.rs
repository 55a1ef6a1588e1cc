//! Session lifecycle and per-account limit enforcement.

mod common;

use std::sync::Arc;

use uuid::Uuid;

use common::{Stores, account, device_for, meta};
use keystone_auth::hash::sha256_hex;
use keystone_auth::session::{LimitOutcome, NewSession, SessionManager};
use keystone_core::AuthError;
use keystone_core::config::session::SessionConfig;
use keystone_entity::account::Account;
use keystone_entity::session::TerminationReason;
use keystone_store::traits::{SecurityEventStore, SessionStore};

fn manager(stores: &Stores, config: SessionConfig) -> SessionManager {
    SessionManager::new(
        config,
        stores.sessions.clone() as Arc<dyn SessionStore>,
        stores.events.clone() as Arc<dyn SecurityEventStore>,
    )
}

async fn login(manager: &SessionManager, account: &Account) -> (uuid::Uuid, LimitOutcome) {
    let id = Uuid::new_v4();
    let access_hash = sha256_hex(&format!("access-{id}"));
    let (session, outcome) = manager
        .create_session(
            account,
            None,
            NewSession {
                id,
                access_token_hash: &access_hash,
                refresh_token_hash: None,
            },
            &meta(),
        )
        .await
        .unwrap();
    (session.id, outcome)
}

#[tokio::test]
async fn test_create_session_under_limit() {
    let stores = Stores::new();
    let manager = manager(&stores, SessionConfig::default());
    let account = account();

    let (session_id, outcome) = login(&manager, &account).await;
    assert_eq!(outcome, LimitOutcome::UnderLimit);

    let session = manager
        .find_session_with_account(session_id, account.id)
        .await
        .unwrap();
    assert!(session.is_active());
    assert_eq!(session.ip_address.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_session_bound_to_device() {
    let stores = Stores::new();
    let manager = manager(&stores, SessionConfig::default());
    let account = account();
    let device = device_for(account.id);

    let (session, _) = manager
        .create_session(
            &account,
            Some(&device),
            NewSession {
                id: Uuid::new_v4(),
                access_token_hash: &sha256_hex("a"),
                refresh_token_hash: Some(&sha256_hex("r")),
            },
            &meta(),
        )
        .await
        .unwrap();
    assert_eq!(session.device_id, Some(device.id));
    assert!(session.refresh_token_hash.is_some());
}

#[tokio::test]
async fn test_terminate_is_idempotent() {
    let stores = Stores::new();
    let manager = manager(&stores, SessionConfig::default());
    let account = account();

    let (session_id, _) = login(&manager, &account).await;

    assert!(
        manager
            .terminate_session(session_id, TerminationReason::LoggedOut)
            .await
            .unwrap()
    );
    // Second call is a no-op, not an error.
    assert!(
        !manager
            .terminate_session(session_id, TerminationReason::LoggedOut)
            .await
            .unwrap()
    );

    let stored = stores
        .sessions
        .find_by_id(session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.terminated_reason, Some(TerminationReason::LoggedOut));
}

#[tokio::test]
async fn test_limit_evicts_oldest_session() {
    let stores = Stores::new();
    let manager = manager(
        &stores,
        SessionConfig {
            max_sessions_per_user: 2,
            ..Default::default()
        },
    );
    let account = account();

    let (first, _) = login(&manager, &account).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (_second, _) = login(&manager, &account).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (_third, outcome) = login(&manager, &account).await;

    assert_eq!(outcome, LimitOutcome::EvictedOldest(first));

    let evicted = stores.sessions.find_by_id(first).await.unwrap().unwrap();
    assert_eq!(
        evicted.terminated_reason,
        Some(TerminationReason::LimitExceeded)
    );
    assert_eq!(manager.list_active_sessions(account.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_limit_rejects_when_eviction_disabled() {
    let stores = Stores::new();
    let manager = manager(
        &stores,
        SessionConfig {
            max_sessions_per_user: 1,
            terminate_oldest_on_limit: false,
            ..Default::default()
        },
    );
    let account = account();

    login(&manager, &account).await;

    let err = manager
        .create_session(
            &account,
            None,
            NewSession {
                id: Uuid::new_v4(),
                access_token_hash: &sha256_hex("x"),
                refresh_token_hash: None,
            },
            &meta(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::SessionLimitExceeded { max_sessions: 1 }
    ));
    assert_eq!(stores.sessions.count_active(account.id, chrono::Utc::now()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_limit_not_enforced_when_disabled() {
    let stores = Stores::new();
    let manager = manager(
        &stores,
        SessionConfig {
            max_sessions_per_user: 1,
            enforce_session_limits: false,
            ..Default::default()
        },
    );
    let account = account();

    for _ in 0..3 {
        let (_, outcome) = login(&manager, &account).await;
        assert_eq!(outcome, LimitOutcome::UnderLimit);
    }
    assert_eq!(manager.list_active_sessions(account.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_find_session_with_wrong_account_is_not_found() {
    let stores = Stores::new();
    let manager = manager(&stores, SessionConfig::default());
    let account = account();

    let (session_id, _) = login(&manager, &account).await;

    let err = manager
        .find_session_with_account(session_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionNotFound));
}

#[tokio::test]
async fn test_find_terminated_session_is_rejected() {
    let stores = Stores::new();
    let manager = manager(&stores, SessionConfig::default());
    let account = account();

    let (session_id, _) = login(&manager, &account).await;
    manager
        .terminate_session(session_id, TerminationReason::AdminAction)
        .await
        .unwrap();

    let err = manager
        .find_session_with_account(session_id, account.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionTerminated));
}

#[tokio::test]
async fn test_terminate_all_user_sessions() {
    let stores = Stores::new();
    let manager = manager(&stores, SessionConfig::default());
    let account = account();
    let other = common::account();

    login(&manager, &account).await;
    login(&manager, &account).await;
    let (other_session, _) = login(&manager, &other).await;

    let count = manager
        .terminate_all_user_sessions(account.id, TerminationReason::AccountSuspended)
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert!(manager.list_active_sessions(account.id).await.unwrap().is_empty());

    // Other accounts are untouched.
    assert!(
        manager
            .find_session_with_account(other_session, other.id)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_session_expiry_uses_day_cap() {
    let stores = Stores::new();
    let manager = manager(
        &stores,
        SessionConfig {
            session_expiry_hours: 24 * 365,
            max_session_expiry_days: 30,
            ..Default::default()
        },
    );
    let account = account();

    let (session_id, _) = login(&manager, &account).await;
    let session = stores
        .sessions
        .find_by_id(session_id)
        .await
        .unwrap()
        .unwrap();
    let lifetime = session.expires_at - session.created_at;
    assert_eq!(lifetime.num_hours(), 30 * 24);
}
