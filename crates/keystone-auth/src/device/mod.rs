//! Device identity: fingerprint derivation and the device registry.

pub mod fingerprint;
pub mod registry;

pub use fingerprint::DeviceDescriptor;
pub use registry::DeviceRegistry;
