//! Revocation store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keystone_core::{AuthError, AuthResult};
use keystone_entity::token::RevokedToken;

use crate::traits::RevocationStore;

/// PostgreSQL-backed revocation store.
#[derive(Debug, Clone)]
pub struct PgRevocationStore {
    pool: PgPool,
}

impl PgRevocationStore {
    /// Create a new revocation store over the shared pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationStore for PgRevocationStore {
    async fn revoke(&self, token: &RevokedToken) -> AuthResult<()> {
        // The hash is the primary key; concurrent revocations of the
        // same token collapse into one row.
        sqlx::query(
            "INSERT INTO revoked_tokens (token_hash, token_kind, account_id, expires_at, revoked_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (token_hash) DO NOTHING",
        )
        .bind(&token.token_hash)
        .bind(token.token_kind)
        .bind(token.account_id)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to revoke token", e))?;
        Ok(())
    }

    async fn is_revoked(&self, token_hash: &str) -> AuthResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM revoked_tokens WHERE token_hash = $1")
                .bind(token_hash)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AuthError::store_with_source("Failed to check revocation", e))?;
        Ok(count > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to purge revoked tokens", e))?;

        Ok(result.rows_affected())
    }
}
