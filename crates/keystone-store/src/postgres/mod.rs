//! PostgreSQL store implementations.
//!
//! Each repository wraps a shared [`sqlx::PgPool`]. Conditional updates
//! carry their guard in the SQL itself so that no operation needs more
//! than one round trip to be atomic.

pub mod account;
pub mod device;
pub mod event;
pub mod rate_limit;
pub mod revocation;
pub mod session;

pub use account::PgAccountStore;
pub use device::PgDeviceStore;
pub use event::PgSecurityEventStore;
pub use rate_limit::PgRateLimitStore;
pub use revocation::PgRevocationStore;
pub use session::PgSessionStore;
