//! The narrow store interface consumed by the Keystone core.
//!
//! Every exclusive-access need is expressed as a short, conditional,
//! single-round-trip update on these traits rather than a long-held
//! lock: the failed-attempt increment returns its post-value, the
//! refresh-token rebind is a compare-and-swap, and the rate-limit
//! attempt is one atomic read-modify-write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use keystone_core::AuthResult;
use keystone_core::config::rate_limit::RateLimitRule;
use keystone_entity::account::{Account, AccountStatus};
use keystone_entity::device::Device;
use keystone_entity::event::SecurityEvent;
use keystone_entity::ratelimit::{RateLimitKey, RateLimitRecord};
use keystone_entity::session::{Session, TerminationReason};
use keystone_entity::token::RevokedToken;

/// Account lookups and the security-relevant account mutations.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Find an account by ID.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>>;

    /// Insert a new account row.
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Record a successful login: timestamp, source IP, counter reset.
    async fn record_login(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        ip: Option<&str>,
    ) -> AuthResult<()>;

    /// Atomically increment the failed-attempt counter, returning the
    /// post-increment value.
    async fn increment_failed_attempts(&self, id: Uuid) -> AuthResult<i32>;

    /// Reset the failed-attempt counter and clear any lockout.
    async fn reset_failed_attempts(&self, id: Uuid) -> AuthResult<()>;

    /// Lock the account until the given time.
    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> AuthResult<()>;

    /// Transition the account status. `Deleted` stamps the soft-delete
    /// timestamp.
    async fn set_status(&self, id: Uuid, status: AccountStatus, at: DateTime<Utc>)
        -> AuthResult<()>;
}

/// Device identity, trust/block state, and refresh-token binding.
#[async_trait]
pub trait DeviceStore: Send + Sync + 'static {
    /// Find a device by ID.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Device>>;

    /// Find a device by its owning account and fingerprint.
    async fn find_by_fingerprint(
        &self,
        account_id: Uuid,
        fingerprint: &str,
    ) -> AuthResult<Option<Device>>;

    /// Insert a new device row.
    async fn create(&self, device: &Device) -> AuthResult<()>;

    /// Refresh last-seen metadata in place.
    async fn touch(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> AuthResult<()>;

    /// Stamp the block timestamp and reason.
    async fn block(&self, id: Uuid, reason: &str, at: DateTime<Utc>) -> AuthResult<()>;

    /// Clear the block timestamp and reason.
    async fn unblock(&self, id: Uuid) -> AuthResult<()>;

    /// Bind a refresh token to the device unconditionally (fresh issue).
    async fn bind_refresh_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Compare-and-swap the bound refresh token: the update commits only
    /// if the stored hash still equals `expected_hash`. Returns whether
    /// the swap won. `new_hash = None` clears the binding.
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> AuthResult<bool>;
}

/// Session persistence and bulk state transitions.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Insert a new session row.
    async fn create(&self, session: &Session) -> AuthResult<()>;

    /// Find a session by ID.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Session>>;

    /// Find a session by ID, constrained to the claimed account.
    async fn find_for_account(&self, id: Uuid, account_id: Uuid) -> AuthResult<Option<Session>>;

    /// Find the non-terminated session holding this refresh token hash.
    async fn find_by_refresh_hash(&self, token_hash: &str) -> AuthResult<Option<Session>>;

    /// Count active (non-terminated, non-expired) sessions for an account.
    async fn count_active(&self, account_id: Uuid, now: DateTime<Utc>) -> AuthResult<i64>;

    /// Find the oldest active session for an account.
    async fn find_oldest_active(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>>;

    /// List active sessions for an account.
    async fn find_active_for_account(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AuthResult<Vec<Session>>;

    /// List sessions whose expiry has passed but are not yet terminated.
    async fn find_expired(&self, now: DateTime<Utc>) -> AuthResult<Vec<Session>>;

    /// Transition Active → Terminated. Returns `false` when the session
    /// was already terminated (idempotent no-op).
    async fn terminate(
        &self,
        id: Uuid,
        reason: TerminationReason,
        at: DateTime<Utc>,
    ) -> AuthResult<bool>;

    /// Bulk-terminate every active session for an account. Returns the
    /// number of sessions transitioned.
    async fn terminate_all_for_account(
        &self,
        account_id: Uuid,
        reason: TerminationReason,
        at: DateTime<Utc>,
    ) -> AuthResult<u64>;

    /// Update the last-activity timestamp.
    async fn touch_activity(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<()>;

    /// Swap the session's refresh token hash during rotation, matched by
    /// the outgoing hash. Returns whether a row was updated.
    async fn rebind_refresh_hash(&self, old_hash: &str, new_hash: &str) -> AuthResult<bool>;

    /// Delete terminated sessions older than the retention cutoff.
    async fn purge_terminated_before(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}

/// Append-only record of invalidated token hashes.
#[async_trait]
pub trait RevocationStore: Send + Sync + 'static {
    /// Record a revoked token. Idempotent: revoking the same hash twice
    /// is a no-op.
    async fn revoke(&self, token: &RevokedToken) -> AuthResult<()>;

    /// Whether the given token hash has been revoked.
    async fn is_revoked(&self, token_hash: &str) -> AuthResult<bool>;

    /// Purge rows whose original expiry has passed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Sliding-window attempt counters.
#[async_trait]
pub trait RateLimitStore: Send + Sync + 'static {
    /// Record one attempt for the key as a single atomic read-modify-write:
    /// lazily create the record, roll the window if expired, then either
    /// count the attempt or stamp `blocked_until` when the cap was already
    /// reached. Two concurrent attempts must never both pass the cap.
    ///
    /// Returns the post-update record; the caller derives the decision
    /// from `attempts` and `blocked_until`.
    async fn record_attempt(
        &self,
        key: &RateLimitKey,
        rule: &RateLimitRule,
        now: DateTime<Utc>,
    ) -> AuthResult<RateLimitRecord>;

    /// Fetch the current record for a key, if any.
    async fn find(&self, key: &RateLimitKey) -> AuthResult<Option<RateLimitRecord>>;

    /// Manually reset a key's window and block (e.g. after successful
    /// verification).
    async fn reset(&self, key: &RateLimitKey) -> AuthResult<()>;

    /// Delete records not touched since the cutoff.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}

/// Append-only security event trail.
#[async_trait]
pub trait SecurityEventStore: Send + Sync + 'static {
    /// Append an event.
    async fn append(&self, event: &SecurityEvent) -> AuthResult<()>;

    /// Events for an account since the given time, newest first.
    async fn recent_for_account(
        &self,
        account_id: Uuid,
        since: DateTime<Utc>,
    ) -> AuthResult<Vec<SecurityEvent>>;
}
