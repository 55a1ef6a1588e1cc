//! Security event trail entities.

pub mod model;
pub mod severity;

pub use model::SecurityEvent;
pub use severity::{EventCategory, EventSeverity};
