//! Device registry upsert and block state.

mod common;

use std::sync::Arc;

use common::{Stores, account};
use keystone_auth::DeviceRegistry;
use keystone_core::types::RequestMeta;
use keystone_store::traits::{DeviceStore, SecurityEventStore};

fn registry(stores: &Stores) -> DeviceRegistry {
    DeviceRegistry::new(
        stores.devices.clone() as Arc<dyn DeviceStore>,
        stores.events.clone() as Arc<dyn SecurityEventStore>,
    )
}

fn mobile_meta(ip: &str) -> RequestMeta {
    RequestMeta::extract(
        Some(ip),
        None,
        Some("AcmeApp/2.4.1 (Pixel 8;Android 14;UID-42)"),
        None,
    )
}

#[tokio::test]
async fn test_register_then_touch_is_same_device() {
    let stores = Stores::new();
    let registry = registry(&stores);
    let account = account();

    let first = registry
        .register_or_touch(account.id, &mobile_meta("203.0.113.7"))
        .await
        .unwrap();
    assert_eq!(first.name.as_deref(), Some("Pixel 8"));
    assert_eq!(first.platform.as_deref(), Some("Android 14"));

    // Same client from a new IP maps onto the same device row.
    let second = registry
        .register_or_touch(account.id, &mobile_meta("198.51.100.9"))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.last_ip.as_deref(), Some("198.51.100.9"));
}

#[tokio::test]
async fn test_distinct_clients_get_distinct_devices() {
    let stores = Stores::new();
    let registry = registry(&stores);
    let account = account();

    let mobile = registry
        .register_or_touch(account.id, &mobile_meta("203.0.113.7"))
        .await
        .unwrap();
    let browser = registry
        .register_or_touch(
            account.id,
            &RequestMeta::extract(
                Some("203.0.113.7"),
                None,
                Some(
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
                ),
                None,
            ),
        )
        .await
        .unwrap();

    assert_ne!(mobile.id, browser.id);
    assert_eq!(browser.platform.as_deref(), Some("Windows NT 10.0"));
}

#[tokio::test]
async fn test_same_fingerprint_different_accounts_are_distinct() {
    let stores = Stores::new();
    let registry = registry(&stores);
    let first = account();
    let second = account();

    let a = registry
        .register_or_touch(first.id, &mobile_meta("203.0.113.7"))
        .await
        .unwrap();
    let b = registry
        .register_or_touch(second.id, &mobile_meta("203.0.113.7"))
        .await
        .unwrap();

    assert_eq!(a.fingerprint, b.fingerprint);
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_block_and_unblock() {
    let stores = Stores::new();
    let registry = registry(&stores);
    let account = account();

    let device = registry
        .register_or_touch(account.id, &mobile_meta("203.0.113.7"))
        .await
        .unwrap();

    registry.block(device.id, "reported stolen").await.unwrap();
    let blocked = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    assert!(blocked.is_blocked());
    assert_eq!(blocked.blocked_reason.as_deref(), Some("reported stolen"));

    let events = stores.events.all().await;
    assert!(events.iter().any(|e| e.event_type == "device_blocked"));

    registry.unblock(device.id).await.unwrap();
    let unblocked = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    assert!(!unblocked.is_blocked());
    assert!(unblocked.blocked_reason.is_none());
}

#[tokio::test]
async fn test_registration_appends_event() {
    let stores = Stores::new();
    let registry = registry(&stores);
    let account = account();

    registry
        .register_or_touch(account.id, &mobile_meta("203.0.113.7"))
        .await
        .unwrap();
    // The second visit only touches; no second registration event.
    registry
        .register_or_touch(account.id, &mobile_meta("203.0.113.7"))
        .await
        .unwrap();

    let registrations = stores
        .events
        .all()
        .await
        .into_iter()
        .filter(|e| e.event_type == "device_registered")
        .count();
    assert_eq!(registrations, 1);
}
