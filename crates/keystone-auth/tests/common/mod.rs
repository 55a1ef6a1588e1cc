//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use keystone_auth::hash::sha256_hex;
use keystone_core::config::token::TokenConfig;
use keystone_core::types::RequestMeta;
use keystone_entity::account::{Account, AccountStatus};
use keystone_entity::device::Device;
use keystone_entity::session::Session;
use keystone_store::memory::{
    MemoryAccountStore, MemoryDeviceStore, MemoryRateLimitStore, MemoryRevocationStore,
    MemorySecurityEventStore, MemorySessionStore,
};

pub struct Stores {
    pub accounts: Arc<MemoryAccountStore>,
    pub devices: Arc<MemoryDeviceStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub revocations: Arc<MemoryRevocationStore>,
    pub rate_limits: Arc<MemoryRateLimitStore>,
    pub events: Arc<MemorySecurityEventStore>,
}

impl Stores {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(MemoryAccountStore::new()),
            devices: Arc::new(MemoryDeviceStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            revocations: Arc::new(MemoryRevocationStore::new()),
            rate_limits: Arc::new(MemoryRateLimitStore::new()),
            events: Arc::new(MemorySecurityEventStore::new()),
        }
    }
}

pub fn token_config() -> TokenConfig {
    TokenConfig {
        secret: "integration-test-secret-0123456789".to_string(),
        issuer: "keystone".to_string(),
        access_ttl_minutes: 15,
        refresh_ttl_days: 90,
        rotation_window_days: 7,
    }
}

/// A token config whose refresh TTL sits inside the rotation window, so
/// every presented refresh token qualifies for rotation.
pub fn rotating_token_config() -> TokenConfig {
    TokenConfig {
        refresh_ttl_days: 3,
        rotation_window_days: 7,
        ..token_config()
    }
}

pub fn account() -> Account {
    let now = Utc::now();
    Account {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        username: "ada".to_string(),
        display_name: Some("Ada L.".to_string()),
        email_verified: true,
        phone_verified: false,
        avatar_url: None,
        plan: "free".to_string(),
        status: AccountStatus::Active,
        failed_login_attempts: 0,
        lock_until: None,
        last_login_at: Some(now - Duration::days(1)),
        last_login_ip: None,
        deleted_at: None,
        created_at: now - Duration::days(30),
        updated_at: now,
    }
}

pub fn device_for(account_id: Uuid) -> Device {
    let now = Utc::now();
    Device {
        id: Uuid::new_v4(),
        account_id,
        fingerprint: sha256_hex("fixture-device"),
        name: Some("Pixel 8".to_string()),
        platform: Some("Android 14".to_string()),
        trusted: false,
        refresh_token_hash: None,
        refresh_expires_at: None,
        blocked_at: None,
        blocked_reason: None,
        last_seen_at: now,
        last_ip: None,
        user_agent: None,
        created_at: now,
    }
}

pub fn session_for(account_id: Uuid, device_id: Option<Uuid>) -> Session {
    let now = Utc::now();
    Session {
        id: Uuid::new_v4(),
        account_id,
        device_id,
        access_token_hash: sha256_hex("fixture-access"),
        refresh_token_hash: None,
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: None,
        created_at: now,
        last_activity: now,
        expires_at: now + Duration::hours(24),
        terminated_at: None,
        terminated_reason: None,
    }
}

pub fn meta() -> RequestMeta {
    RequestMeta::extract(
        Some("203.0.113.7"),
        None,
        Some("AcmeApp/2.4.1 (Pixel 8;Android 14;FIXTURE-UID)"),
        None,
    )
}
