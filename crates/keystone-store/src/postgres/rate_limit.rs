//! Rate-limit store implementation.
//!
//! The attempt path is one `INSERT ... ON CONFLICT DO UPDATE` whose
//! `CASE` guards express window rollover, the conditional increment,
//! and block stamping in a single atomic statement. A plain
//! read-then-write would let two concurrent attempts both pass the cap.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use keystone_core::config::rate_limit::RateLimitRule;
use keystone_core::{AuthError, AuthResult};
use keystone_entity::ratelimit::{RateLimitKey, RateLimitRecord};

use crate::traits::RateLimitStore;

/// PostgreSQL-backed rate-limit store.
#[derive(Debug, Clone)]
pub struct PgRateLimitStore {
    pool: PgPool,
}

impl PgRateLimitStore {
    /// Create a new rate-limit store over the shared pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitStore for PgRateLimitStore {
    async fn record_attempt(
        &self,
        key: &RateLimitKey,
        rule: &RateLimitRule,
        now: DateTime<Utc>,
    ) -> AuthResult<RateLimitRecord> {
        let window_end = now + Duration::seconds(rule.window_seconds as i64);
        // Block deadline when the cap is hit: explicit cool-down when
        // configured, otherwise the end of the current window.
        let block_override =
            rule.block_seconds.map(|s| now + Duration::seconds(s as i64));

        sqlx::query_as::<_, RateLimitRecord>(
            "INSERT INTO rate_limits \
             (id, identifier, limit_type, scope, window_start, window_end, attempts, \
              max_attempts, blocked_until, metadata, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 1, $7, NULL, NULL, $5, $5) \
             ON CONFLICT (identifier, limit_type, scope) DO UPDATE SET \
               window_start = CASE WHEN rate_limits.window_end <= $5 \
                                   THEN $5 ELSE rate_limits.window_start END, \
               window_end   = CASE WHEN rate_limits.window_end <= $5 \
                                   THEN $6 ELSE rate_limits.window_end END, \
               attempts     = CASE WHEN rate_limits.window_end <= $5 THEN 1 \
                                   WHEN rate_limits.attempts < rate_limits.max_attempts \
                                   THEN rate_limits.attempts + 1 \
                                   ELSE rate_limits.attempts END, \
               blocked_until = CASE WHEN rate_limits.window_end <= $5 THEN NULL \
                                    WHEN rate_limits.attempts >= rate_limits.max_attempts \
                                    THEN COALESCE(rate_limits.blocked_until, \
                                                  COALESCE($8, rate_limits.window_end)) \
                                    ELSE rate_limits.blocked_until END, \
               max_attempts = $7, \
               updated_at = $5 \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&key.identifier)
        .bind(key.limit_type)
        .bind(&key.scope)
        .bind(now)
        .bind(window_end)
        .bind(rule.max_attempts as i32)
        .bind(block_override)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to record rate-limit attempt", e))
    }

    async fn find(&self, key: &RateLimitKey) -> AuthResult<Option<RateLimitRecord>> {
        sqlx::query_as::<_, RateLimitRecord>(
            "SELECT * FROM rate_limits WHERE identifier = $1 AND limit_type = $2 AND scope = $3",
        )
        .bind(&key.identifier)
        .bind(key.limit_type)
        .bind(&key.scope)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to find rate-limit record", e))
    }

    async fn reset(&self, key: &RateLimitKey) -> AuthResult<()> {
        sqlx::query(
            "UPDATE rate_limits SET attempts = 0, blocked_until = NULL, updated_at = NOW() \
             WHERE identifier = $1 AND limit_type = $2 AND scope = $3",
        )
        .bind(&key.identifier)
        .bind(key.limit_type)
        .bind(&key.scope)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to reset rate-limit window", e))?;
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE updated_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::store_with_source("Failed to purge rate-limit records", e))?;

        Ok(result.rows_affected())
    }
}
