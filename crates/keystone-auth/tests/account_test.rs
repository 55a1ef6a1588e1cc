//! Account state gates and the failed-login lockout.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};

use common::{Stores, account, meta};
use keystone_auth::AccountPolicy;
use keystone_core::AuthError;
use keystone_core::config::security::SecurityConfig;
use keystone_entity::account::AccountStatus;
use keystone_store::traits::{AccountStore, SecurityEventStore};

fn policy(stores: &Stores, config: SecurityConfig) -> AccountPolicy {
    AccountPolicy::new(
        config,
        stores.accounts.clone() as Arc<dyn AccountStore>,
        stores.events.clone() as Arc<dyn SecurityEventStore>,
    )
}

#[tokio::test]
async fn test_status_gates() {
    let stores = Stores::new();
    let policy = policy(&stores, SecurityConfig::default());

    let mut account = account();
    assert!(policy.ensure_can_authenticate(&account).is_ok());

    account.status = AccountStatus::Pending;
    assert!(policy.ensure_can_authenticate(&account).is_ok());

    account.status = AccountStatus::Suspended;
    assert!(matches!(
        policy.ensure_can_authenticate(&account),
        Err(AuthError::AccountSuspended)
    ));

    account.status = AccountStatus::Deleted;
    assert!(matches!(
        policy.ensure_can_authenticate(&account),
        Err(AuthError::AccountDeleted)
    ));
}

#[tokio::test]
async fn test_active_lock_rejects_with_expiry() {
    let stores = Stores::new();
    let policy = policy(&stores, SecurityConfig::default());

    let mut account = account();
    let until = Utc::now() + Duration::minutes(30);
    account.lock_until = Some(until);

    let err = policy.ensure_can_authenticate(&account).unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked { until: u } if u == until));

    // An expired lock no longer gates.
    account.lock_until = Some(Utc::now() - Duration::minutes(1));
    assert!(policy.ensure_can_authenticate(&account).is_ok());
}

#[tokio::test]
async fn test_repeated_failures_lock_the_account() {
    let stores = Stores::new();
    let policy = policy(&stores, SecurityConfig::default());

    let account = account();
    stores.accounts.create(&account).await.unwrap();

    // Default cap is 5 failures.
    for _ in 0..4 {
        policy.record_failure(account.id, &meta()).await.unwrap();
    }
    let stored = stores.accounts.find_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 4);
    assert!(stored.lock_until.is_none());

    policy.record_failure(account.id, &meta()).await.unwrap();
    let stored = stores.accounts.find_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 5);
    assert!(stored.lock_until.is_some());

    let events = stores.events.all().await;
    assert!(events.iter().any(|e| e.event_type == "account_locked"));
    assert_eq!(
        events.iter().filter(|e| e.event_type == "login_failed").count(),
        5
    );
}

#[tokio::test]
async fn test_success_resets_counter_and_lock() {
    let stores = Stores::new();
    let policy = policy(&stores, SecurityConfig::default());

    let account = account();
    stores.accounts.create(&account).await.unwrap();

    for _ in 0..5 {
        policy.record_failure(account.id, &meta()).await.unwrap();
    }

    policy.record_success(account.id, &meta()).await.unwrap();
    let stored = stores.accounts.find_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 0);
    assert!(stored.lock_until.is_none());
    assert_eq!(stored.last_login_ip.as_deref(), Some("203.0.113.7"));
    assert!(stored.last_login_at.is_some());
}
