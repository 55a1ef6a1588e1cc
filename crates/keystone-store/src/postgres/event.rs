//! Security event store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use keystone_core::{AuthError, AuthResult};
use keystone_entity::event::SecurityEvent;

use crate::traits::SecurityEventStore;

/// PostgreSQL-backed security event store.
#[derive(Debug, Clone)]
pub struct PgSecurityEventStore {
    pool: PgPool,
}

impl PgSecurityEventStore {
    /// Create a new event store over the shared pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecurityEventStore for PgSecurityEventStore {
    async fn append(&self, event: &SecurityEvent) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO security_events (id, account_id, event_type, category, severity, \
             ip_address, user_agent, session_id, data, created_at, resolved_at, resolved_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(event.id)
        .bind(event.account_id)
        .bind(&event.event_type)
        .bind(event.category)
        .bind(event.severity)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(event.session_id)
        .bind(&event.data)
        .bind(event.created_at)
        .bind(event.resolved_at)
        .bind(event.resolved_by)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to append security event", e))?;
        Ok(())
    }

    async fn recent_for_account(
        &self,
        account_id: Uuid,
        since: DateTime<Utc>,
    ) -> AuthResult<Vec<SecurityEvent>> {
        sqlx::query_as::<_, SecurityEvent>(
            "SELECT * FROM security_events \
             WHERE account_id = $1 AND created_at >= $2 \
             ORDER BY created_at DESC",
        )
        .bind(account_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to list security events", e))
    }
}
