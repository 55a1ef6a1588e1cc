//! Session state machine and per-account limit enforcement.

pub mod manager;

pub use manager::{LimitOutcome, NewSession, SessionManager};
