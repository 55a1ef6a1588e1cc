//! Shared types used across the Keystone crates.

pub mod request_meta;

pub use request_meta::RequestMeta;
