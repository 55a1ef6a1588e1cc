//! Rate-limit record, key, and limit-type enumeration.

pub mod limit_type;
pub mod record;

pub use limit_type::LimitType;
pub use record::{RateLimitKey, RateLimitRecord};
