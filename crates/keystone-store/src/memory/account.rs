//! In-memory account store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use keystone_core::{AuthError, AuthResult};
use keystone_entity::account::{Account, AccountStatus};

use crate::traits::AccountStore;

/// In-memory account store keyed by account ID.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<Mutex<HashMap<Uuid, Account>>>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>> {
        Ok(self.accounts.lock().await.get(&id).cloned())
    }

    async fn create(&self, account: &Account) -> AuthResult<()> {
        self.accounts
            .lock()
            .await
            .insert(account.id, account.clone());
        Ok(())
    }

    async fn record_login(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        ip: Option<&str>,
    ) -> AuthResult<()> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Account not found"))?;
        account.last_login_at = Some(at);
        account.last_login_ip = ip.map(str::to_string);
        account.failed_login_attempts = 0;
        account.lock_until = None;
        account.updated_at = at;
        Ok(())
    }

    async fn increment_failed_attempts(&self, id: Uuid) -> AuthResult<i32> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Account not found"))?;
        account.failed_login_attempts += 1;
        account.updated_at = Utc::now();
        Ok(account.failed_login_attempts)
    }

    async fn reset_failed_attempts(&self, id: Uuid) -> AuthResult<()> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Account not found"))?;
        account.failed_login_attempts = 0;
        account.lock_until = None;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> AuthResult<()> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Account not found"))?;
        account.lock_until = Some(until);
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AccountStatus,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| AuthError::store("Account not found"))?;
        account.status = status;
        if status == AccountStatus::Deleted {
            account.deleted_at = Some(at);
        }
        account.updated_at = at;
        Ok(())
    }
}
