//! In-memory session store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use keystone_core::AuthResult;
use keystone_entity::session::{Session, TerminationReason};

use crate::traits::SessionStore;

/// In-memory session store keyed by session ID.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_active(session: &Session, now: DateTime<Utc>) -> bool {
    session.terminated_at.is_none() && session.expires_at > now
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        self.sessions
            .lock()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Session>> {
        Ok(self.sessions.lock().await.get(&id).cloned())
    }

    async fn find_for_account(&self, id: Uuid, account_id: Uuid) -> AuthResult<Option<Session>> {
        Ok(self
            .sessions
            .lock()
            .await
            .get(&id)
            .filter(|s| s.account_id == account_id)
            .cloned())
    }

    async fn find_by_refresh_hash(&self, token_hash: &str) -> AuthResult<Option<Session>> {
        Ok(self
            .sessions
            .lock()
            .await
            .values()
            .find(|s| {
                s.terminated_at.is_none() && s.refresh_token_hash.as_deref() == Some(token_hash)
            })
            .cloned())
    }

    async fn count_active(&self, account_id: Uuid, now: DateTime<Utc>) -> AuthResult<i64> {
        Ok(self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| s.account_id == account_id && is_active(s, now))
            .count() as i64)
    }

    async fn find_oldest_active(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>> {
        Ok(self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| s.account_id == account_id && is_active(s, now))
            .min_by_key(|s| s.created_at)
            .cloned())
    }

    async fn find_active_for_account(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AuthResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| s.account_id == account_id && is_active(s, now))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> AuthResult<Vec<Session>> {
        Ok(self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| s.terminated_at.is_none() && s.expires_at <= now)
            .cloned()
            .collect())
    }

    async fn terminate(
        &self,
        id: Uuid,
        reason: TerminationReason,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&id) {
            Some(session) if session.terminated_at.is_none() => {
                session.terminated_at = Some(at);
                session.terminated_reason = Some(reason);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn terminate_all_for_account(
        &self,
        account_id: Uuid,
        reason: TerminationReason,
        at: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock().await;
        let mut terminated = 0u64;
        for session in sessions.values_mut() {
            if session.account_id == account_id && session.terminated_at.is_none() {
                session.terminated_at = Some(at);
                session.terminated_reason = Some(reason);
                terminated += 1;
            }
        }
        Ok(terminated)
    }

    async fn touch_activity(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(session) = self.sessions.lock().await.get_mut(&id) {
            session.last_activity = at;
        }
        Ok(())
    }

    async fn rebind_refresh_hash(&self, old_hash: &str, new_hash: &str) -> AuthResult<bool> {
        let mut sessions = self.sessions.lock().await;
        for session in sessions.values_mut() {
            if session.terminated_at.is_none()
                && session.refresh_token_hash.as_deref() == Some(old_hash)
            {
                session.refresh_token_hash = Some(new_hash.to_string());
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn purge_terminated_before(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.terminated_at.is_some_and(|at| at < cutoff));
        Ok((before - sessions.len()) as u64)
    }
}
