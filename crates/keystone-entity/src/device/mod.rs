//! Device entity model.

pub mod model;

pub use model::Device;
