//! Account-side authentication policy: state gates and the lockout
//! counter.

pub mod policy;

pub use policy::AccountPolicy;
