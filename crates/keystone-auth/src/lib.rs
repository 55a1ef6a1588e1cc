//! # keystone-auth
//!
//! The authentication core: token issuance, verification, and rotation;
//! device identity; the session state machine and per-account limits;
//! sliding-window rate limiting; and the security risk analyzer that
//! drives automated account actions.

pub mod account;
pub mod device;
pub mod hash;
pub mod jwt;
pub mod ratelimit;
pub mod risk;
pub mod session;
pub mod sweeper;
pub mod token;

pub use account::AccountPolicy;
pub use device::DeviceRegistry;
pub use ratelimit::RateLimiter;
pub use risk::SecurityRiskAnalyzer;
pub use session::SessionManager;
pub use sweeper::MaintenanceSweeper;
pub use token::TokenIssuer;
