//! Convenience result type alias for Keystone.

use crate::error::AuthError;

/// A specialized `Result` type for Keystone operations.
///
/// Defined as a convenience so that every crate does not need to
/// write `Result<T, AuthError>` explicitly.
pub type AuthResult<T> = Result<T, AuthError>;
