//! In-memory revocation store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use keystone_core::AuthResult;
use keystone_entity::token::RevokedToken;

use crate::traits::RevocationStore;

/// In-memory revocation store keyed by token hash.
#[derive(Debug, Clone, Default)]
pub struct MemoryRevocationStore {
    revoked: Arc<Mutex<HashMap<String, RevokedToken>>>,
}

impl MemoryRevocationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, token: &RevokedToken) -> AuthResult<()> {
        // First writer wins; re-revoking the same hash is a no-op.
        self.revoked
            .lock()
            .await
            .entry(token.token_hash.clone())
            .or_insert_with(|| token.clone());
        Ok(())
    }

    async fn is_revoked(&self, token_hash: &str) -> AuthResult<bool> {
        Ok(self.revoked.lock().await.contains_key(token_hash))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut revoked = self.revoked.lock().await;
        let before = revoked.len();
        revoked.retain(|_, t| t.expires_at > now);
        Ok((before - revoked.len()) as u64)
    }
}
