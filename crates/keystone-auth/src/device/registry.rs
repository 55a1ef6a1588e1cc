//! The device registry: idempotent upsert and trust/block state.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use keystone_core::types::RequestMeta;
use keystone_core::{AuthError, AuthResult};
use keystone_entity::device::Device;
use keystone_entity::event::{EventCategory, EventSeverity, SecurityEvent};
use keystone_store::traits::{DeviceStore, SecurityEventStore};

use super::fingerprint::DeviceDescriptor;

/// Tracks device identity and block state for accounts.
pub struct DeviceRegistry {
    devices: Arc<dyn DeviceStore>,
    events: Arc<dyn SecurityEventStore>,
}

impl DeviceRegistry {
    pub fn new(devices: Arc<dyn DeviceStore>, events: Arc<dyn SecurityEventStore>) -> Self {
        Self { devices, events }
    }

    /// Idempotent upsert keyed by (account, fingerprint).
    ///
    /// An unknown fingerprint creates a device row; a known one refreshes
    /// last-seen metadata in place. Returns the current device either way.
    pub async fn register_or_touch(
        &self,
        account_id: Uuid,
        meta: &RequestMeta,
    ) -> AuthResult<Device> {
        let descriptor = DeviceDescriptor::derive(meta);
        let now = Utc::now();

        if let Some(mut device) = self
            .devices
            .find_by_fingerprint(account_id, &descriptor.fingerprint)
            .await?
        {
            self.devices
                .touch(device.id, now, meta.ip_string().as_deref(), meta.user_agent.as_deref())
                .await?;
            device.last_seen_at = now;
            device.last_ip = meta.ip_string();
            if meta.user_agent.is_some() {
                device.user_agent = meta.user_agent.clone();
            }
            debug!(account_id = %account_id, device_id = %device.id, "device seen again");
            return Ok(device);
        }

        let device = Device {
            id: Uuid::new_v4(),
            account_id,
            fingerprint: descriptor.fingerprint,
            name: descriptor.name,
            platform: descriptor.platform,
            trusted: false,
            refresh_token_hash: None,
            refresh_expires_at: None,
            blocked_at: None,
            blocked_reason: None,
            last_seen_at: now,
            last_ip: meta.ip_string(),
            user_agent: meta.user_agent.clone(),
            created_at: now,
        };
        self.devices.create(&device).await?;

        self.events
            .append(
                &SecurityEvent::new(
                    Some(account_id),
                    "device_registered",
                    EventCategory::Device,
                    EventSeverity::Low,
                )
                .with_context(meta.ip_string(), meta.user_agent.clone(), None),
            )
            .await?;

        info!(account_id = %account_id, device_id = %device.id, "registered new device");
        Ok(device)
    }

    /// Blocks a device. Tokens bound to a blocked device fail
    /// verification regardless of their own validity.
    pub async fn block(&self, device_id: Uuid, reason: &str) -> AuthResult<()> {
        let device = self
            .devices
            .find_by_id(device_id)
            .await?
            .ok_or_else(|| AuthError::store("device not found"))?;

        let now = Utc::now();
        self.devices.block(device_id, reason, now).await?;

        self.events
            .append(
                &SecurityEvent::new(
                    Some(device.account_id),
                    "device_blocked",
                    EventCategory::Device,
                    EventSeverity::High,
                )
                .with_data(serde_json::json!({
                    "device_id": device_id,
                    "reason": reason,
                })),
            )
            .await?;

        warn!(device_id = %device_id, reason, "device blocked");
        Ok(())
    }

    /// Clears a device's block.
    pub async fn unblock(&self, device_id: Uuid) -> AuthResult<()> {
        self.devices.unblock(device_id).await?;
        info!(device_id = %device_id, "device unblocked");
        Ok(())
    }
}
