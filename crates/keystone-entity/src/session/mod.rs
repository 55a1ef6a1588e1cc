//! Session entity model and termination reasons.

pub mod model;
pub mod termination;

pub use model::Session;
pub use termination::TerminationReason;
