//! Session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use keystone_core::{AuthError, AuthResult};
use keystone_entity::session::{Session, TerminationReason};

use crate::traits::SessionStore;

/// PostgreSQL-backed session store.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session store over the shared pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, account_id, device_id, access_token_hash, \
             refresh_token_hash, ip_address, user_agent, created_at, last_activity, \
             expires_at, terminated_at, terminated_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(session.id)
        .bind(session.account_id)
        .bind(session.device_id)
        .bind(&session.access_token_hash)
        .bind(&session.refresh_token_hash)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity)
        .bind(session.expires_at)
        .bind(session.terminated_at)
        .bind(session.terminated_reason)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to create session", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to find session", e))
    }

    async fn find_for_account(&self, id: Uuid, account_id: Uuid) -> AuthResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1 AND account_id = $2")
            .bind(id)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to find session for account", e))
    }

    async fn find_by_refresh_hash(&self, token_hash: &str) -> AuthResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE refresh_token_hash = $1 AND terminated_at IS NULL",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to find session by refresh token", e))
    }

    async fn count_active(&self, account_id: Uuid, now: DateTime<Utc>) -> AuthResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions \
             WHERE account_id = $1 AND terminated_at IS NULL AND expires_at > $2",
        )
        .bind(account_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to count active sessions", e))
    }

    async fn find_oldest_active(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions \
             WHERE account_id = $1 AND terminated_at IS NULL AND expires_at > $2 \
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(account_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to find oldest session", e))
    }

    async fn find_active_for_account(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AuthResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions \
             WHERE account_id = $1 AND terminated_at IS NULL AND expires_at > $2 \
             ORDER BY created_at DESC",
        )
        .bind(account_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to find active sessions", e))
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> AuthResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE terminated_at IS NULL AND expires_at <= $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to find expired sessions", e))
    }

    async fn terminate(
        &self,
        id: Uuid,
        reason: TerminationReason,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        // The terminated_at IS NULL guard makes repeated termination a no-op.
        let result = sqlx::query(
            "UPDATE sessions SET terminated_at = $2, terminated_reason = $3 \
             WHERE id = $1 AND terminated_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to terminate session", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn terminate_all_for_account(
        &self,
        account_id: Uuid,
        reason: TerminationReason,
        at: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET terminated_at = $2, terminated_reason = $3 \
             WHERE account_id = $1 AND terminated_at IS NULL",
        )
        .bind(account_id)
        .bind(at)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to terminate account sessions", e))?;

        Ok(result.rows_affected())
    }

    async fn touch_activity(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE sessions SET last_activity = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to touch session activity", e))?;
        Ok(())
    }

    async fn rebind_refresh_hash(&self, old_hash: &str, new_hash: &str) -> AuthResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET refresh_token_hash = $2 \
             WHERE refresh_token_hash = $1 AND terminated_at IS NULL",
        )
        .bind(old_hash)
        .bind(new_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to rebind session refresh hash", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn purge_terminated_before(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE terminated_at IS NOT NULL AND terminated_at < $1")
                .bind(cutoff)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AuthError::store_with_source("Failed to purge terminated sessions", e)
                })?;

        Ok(result.rows_affected())
    }
}
