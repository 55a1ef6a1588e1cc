//! In-memory device store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use keystone_core::{AuthError, AuthResult};
use keystone_entity::device::Device;

use crate::traits::DeviceStore;

/// In-memory device store keyed by device ID.
#[derive(Debug, Clone, Default)]
pub struct MemoryDeviceStore {
    devices: Arc<Mutex<HashMap<Uuid, Device>>>,
}

impl MemoryDeviceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Device>> {
        Ok(self.devices.lock().await.get(&id).cloned())
    }

    async fn find_by_fingerprint(
        &self,
        account_id: Uuid,
        fingerprint: &str,
    ) -> AuthResult<Option<Device>> {
        Ok(self
            .devices
            .lock()
            .await
            .values()
            .find(|d| d.account_id == account_id && d.fingerprint == fingerprint)
            .cloned())
    }

    async fn create(&self, device: &Device) -> AuthResult<()> {
        self.devices.lock().await.insert(device.id, device.clone());
        Ok(())
    }

    async fn touch(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> AuthResult<()> {
        let mut devices = self.devices.lock().await;
        let device = devices
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Device not found"))?;
        device.last_seen_at = at;
        if let Some(ip) = ip {
            device.last_ip = Some(ip.to_string());
        }
        if let Some(ua) = user_agent {
            device.user_agent = Some(ua.to_string());
        }
        Ok(())
    }

    async fn block(&self, id: Uuid, reason: &str, at: DateTime<Utc>) -> AuthResult<()> {
        let mut devices = self.devices.lock().await;
        let device = devices
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Device not found"))?;
        device.blocked_at = Some(at);
        device.blocked_reason = Some(reason.to_string());
        Ok(())
    }

    async fn unblock(&self, id: Uuid) -> AuthResult<()> {
        let mut devices = self.devices.lock().await;
        let device = devices
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Device not found"))?;
        device.blocked_at = None;
        device.blocked_reason = None;
        Ok(())
    }

    async fn bind_refresh_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut devices = self.devices.lock().await;
        let device = devices
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Device not found"))?;
        device.refresh_token_hash = Some(token_hash.to_string());
        device.refresh_expires_at = Some(expires_at);
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> AuthResult<bool> {
        let mut devices = self.devices.lock().await;
        let device = devices
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Device not found"))?;

        // Compare-and-swap under the store mutex.
        if device.refresh_token_hash.as_deref() != Some(expected_hash) {
            return Ok(false);
        }

        device.refresh_token_hash = new_hash.map(str::to_string);
        device.refresh_expires_at = expires_at;
        Ok(true)
    }
}
