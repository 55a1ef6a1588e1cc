//! In-memory security event store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use keystone_core::AuthResult;
use keystone_entity::event::SecurityEvent;

use crate::traits::SecurityEventStore;

/// In-memory append-only event trail.
#[derive(Debug, Clone, Default)]
pub struct MemorySecurityEventStore {
    events: Arc<Mutex<Vec<SecurityEvent>>>,
}

impl MemorySecurityEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, for test assertions.
    pub async fn all(&self) -> Vec<SecurityEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl SecurityEventStore for MemorySecurityEventStore {
    async fn append(&self, event: &SecurityEvent) -> AuthResult<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }

    async fn recent_for_account(
        &self,
        account_id: Uuid,
        since: DateTime<Utc>,
    ) -> AuthResult<Vec<SecurityEvent>> {
        let mut events: Vec<SecurityEvent> = self
            .events
            .lock()
            .await
            .iter()
            .filter(|e| e.account_id == Some(account_id) && e.created_at >= since)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }
}
