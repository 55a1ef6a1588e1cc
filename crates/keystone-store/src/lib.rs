//! # keystone-store
//!
//! The narrow transactional-store interface the Keystone core operates
//! through, with two implementations:
//!
//! - [`postgres`] — sqlx-backed repositories where every atomic need is
//!   expressed as a short, conditional, single-round-trip update.
//! - [`memory`] — mutex-guarded maps for single-node deployments and
//!   tests.

pub mod connection;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use traits::{
    AccountStore, DeviceStore, RateLimitStore, RevocationStore, SecurityEventStore, SessionStore,
};
