//! In-memory rate-limit store.
//!
//! The store mutex makes each `record_attempt` an atomic
//! read-modify-write, mirroring the conditional upsert the PostgreSQL
//! implementation performs in one statement.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use keystone_core::AuthResult;
use keystone_core::config::rate_limit::RateLimitRule;
use keystone_entity::ratelimit::{RateLimitKey, RateLimitRecord};

use crate::traits::RateLimitStore;

/// In-memory rate-limit store keyed by (identifier, limit type, scope).
#[derive(Debug, Clone, Default)]
pub struct MemoryRateLimitStore {
    records: Arc<Mutex<HashMap<RateLimitKey, RateLimitRecord>>>,
}

impl MemoryRateLimitStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn record_attempt(
        &self,
        key: &RateLimitKey,
        rule: &RateLimitRule,
        now: DateTime<Utc>,
    ) -> AuthResult<RateLimitRecord> {
        let window_end = now + Duration::seconds(rule.window_seconds as i64);
        let mut records = self.records.lock().await;

        let record = records.entry(key.clone()).or_insert_with(|| RateLimitRecord {
            id: Uuid::new_v4(),
            identifier: key.identifier.clone(),
            limit_type: key.limit_type,
            scope: key.scope.clone(),
            window_start: now,
            window_end,
            attempts: 0,
            max_attempts: rule.max_attempts as i32,
            blocked_until: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        });

        // Window rollover: reset in place before counting this attempt.
        if record.window_end <= now {
            record.window_start = now;
            record.window_end = window_end;
            record.attempts = 0;
            record.blocked_until = None;
        }

        record.max_attempts = rule.max_attempts as i32;

        if record.attempts < record.max_attempts {
            record.attempts += 1;
        } else if record.blocked_until.is_none() {
            record.blocked_until = Some(match rule.block_seconds {
                Some(s) => now + Duration::seconds(s as i64),
                None => record.window_end,
            });
        }

        record.updated_at = now;
        Ok(record.clone())
    }

    async fn find(&self, key: &RateLimitKey) -> AuthResult<Option<RateLimitRecord>> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn reset(&self, key: &RateLimitKey) -> AuthResult<()> {
        if let Some(record) = self.records.lock().await.get_mut(key) {
            record.attempts = 0;
            record.blocked_until = None;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, r| r.updated_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}
