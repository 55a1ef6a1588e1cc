//! # keystone-entity
//!
//! Domain entity models for the Keystone authentication service:
//! accounts, devices, sessions, revoked tokens, rate-limit records,
//! and the append-only security event trail.

pub mod account;
pub mod device;
pub mod event;
pub mod ratelimit;
pub mod session;
pub mod token;
