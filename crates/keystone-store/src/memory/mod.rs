//! In-memory store implementations using Tokio mutexes.
//!
//! Suitable for single-node deployments and tests. Each store guards
//! its map with one mutex, so every trait operation is atomic with
//! respect to concurrent callers, matching the conditional-update
//! semantics of the PostgreSQL implementations.

pub mod account;
pub mod device;
pub mod event;
pub mod rate_limit;
pub mod revocation;
pub mod session;

pub use account::MemoryAccountStore;
pub use device::MemoryDeviceStore;
pub use event::MemorySecurityEventStore;
pub use rate_limit::MemoryRateLimitStore;
pub use revocation::MemoryRevocationStore;
pub use session::MemorySessionStore;
