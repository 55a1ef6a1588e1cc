//! # keystone-core
//!
//! Core crate for the Keystone authentication service. Contains the
//! configuration schemas, request metadata extraction, and the unified
//! error system shared by every other crate.
//!
//! This crate has **no** internal dependencies on other Keystone crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod types;

pub use error::AuthError;
pub use result::AuthResult;
