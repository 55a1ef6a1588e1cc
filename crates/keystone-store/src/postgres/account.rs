//! Account repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use keystone_core::{AuthError, AuthResult};
use keystone_entity::account::{Account, AccountStatus};

use crate::traits::AccountStore;

/// PostgreSQL-backed account store.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new account store over the shared pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to find account", e))
    }

    async fn create(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO accounts (id, tenant_id, username, display_name, email_verified, \
             phone_verified, avatar_url, plan, status, failed_login_attempts, lock_until, \
             last_login_at, last_login_ip, deleted_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(account.id)
        .bind(account.tenant_id)
        .bind(&account.username)
        .bind(&account.display_name)
        .bind(account.email_verified)
        .bind(account.phone_verified)
        .bind(&account.avatar_url)
        .bind(&account.plan)
        .bind(account.status)
        .bind(account.failed_login_attempts)
        .bind(account.lock_until)
        .bind(account.last_login_at)
        .bind(&account.last_login_ip)
        .bind(account.deleted_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to create account", e))?;
        Ok(())
    }

    async fn record_login(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        ip: Option<&str>,
    ) -> AuthResult<()> {
        sqlx::query(
            "UPDATE accounts SET last_login_at = $2, last_login_ip = $3, \
             failed_login_attempts = 0, lock_until = NULL, updated_at = $2 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .bind(ip)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to record login", e))?;
        Ok(())
    }

    async fn increment_failed_attempts(&self, id: Uuid) -> AuthResult<i32> {
        let row: (i32,) = sqlx::query_as(
            "UPDATE accounts SET failed_login_attempts = failed_login_attempts + 1, \
             updated_at = NOW() WHERE id = $1 RETURNING failed_login_attempts",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to increment failed attempts", e))?;
        Ok(row.0)
    }

    async fn reset_failed_attempts(&self, id: Uuid) -> AuthResult<()> {
        sqlx::query(
            "UPDATE accounts SET failed_login_attempts = 0, lock_until = NULL, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to reset failed attempts", e))?;
        Ok(())
    }

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE accounts SET lock_until = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to lock account", e))?;
        Ok(())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AccountStatus,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        sqlx::query(
            "UPDATE accounts SET status = $2, \
             deleted_at = CASE WHEN $2 = 'deleted'::account_status THEN $3 ELSE deleted_at END, \
             updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to update account status", e))?;
        Ok(())
    }
}
