//! Account entity model and status enumeration.

pub mod model;
pub mod status;

pub use model::Account;
pub use status::AccountStatus;
