//! Device repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use keystone_core::{AuthError, AuthResult};
use keystone_entity::device::Device;

use crate::traits::DeviceStore;

/// PostgreSQL-backed device store.
#[derive(Debug, Clone)]
pub struct PgDeviceStore {
    pool: PgPool,
}

impl PgDeviceStore {
    /// Create a new device store over the shared pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceStore for PgDeviceStore {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Device>> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to find device", e))
    }

    async fn find_by_fingerprint(
        &self,
        account_id: Uuid,
        fingerprint: &str,
    ) -> AuthResult<Option<Device>> {
        sqlx::query_as::<_, Device>(
            "SELECT * FROM devices WHERE account_id = $1 AND fingerprint = $2",
        )
        .bind(account_id)
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to find device by fingerprint", e))
    }

    async fn create(&self, device: &Device) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO devices (id, account_id, fingerprint, name, platform, trusted, \
             refresh_token_hash, refresh_expires_at, blocked_at, blocked_reason, \
             last_seen_at, last_ip, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(device.id)
        .bind(device.account_id)
        .bind(&device.fingerprint)
        .bind(&device.name)
        .bind(&device.platform)
        .bind(device.trusted)
        .bind(&device.refresh_token_hash)
        .bind(device.refresh_expires_at)
        .bind(device.blocked_at)
        .bind(&device.blocked_reason)
        .bind(device.last_seen_at)
        .bind(&device.last_ip)
        .bind(&device.user_agent)
        .bind(device.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to create device", e))?;
        Ok(())
    }

    async fn touch(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> AuthResult<()> {
        sqlx::query(
            "UPDATE devices SET last_seen_at = $2, \
             last_ip = COALESCE($3, last_ip), \
             user_agent = COALESCE($4, user_agent) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .bind(ip)
        .bind(user_agent)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to touch device", e))?;
        Ok(())
    }

    async fn block(&self, id: Uuid, reason: &str, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE devices SET blocked_at = $2, blocked_reason = $3 WHERE id = $1")
            .bind(id)
            .bind(at)
            .bind(reason)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to block device", e))?;
        Ok(())
    }

    async fn unblock(&self, id: Uuid) -> AuthResult<()> {
        sqlx::query("UPDATE devices SET blocked_at = NULL, blocked_reason = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to unblock device", e))?;
        Ok(())
    }

    async fn bind_refresh_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        sqlx::query(
            "UPDATE devices SET refresh_token_hash = $2, refresh_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to bind refresh token", e))?;
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> AuthResult<bool> {
        // The WHERE guard makes this a compare-and-swap: only the caller
        // that still sees the stored hash commits.
        let result = sqlx::query(
            "UPDATE devices SET refresh_token_hash = $3, refresh_expires_at = $4 \
             WHERE id = $1 AND refresh_token_hash = $2",
        )
        .bind(id)
        .bind(expected_hash)
        .bind(new_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to swap refresh token", e))?;

        Ok(result.rows_affected() == 1)
    }
}
