//! Token hashing.

use sha2::{Digest, Sha256};

/// SHA-256 of the input, hex-encoded.
///
/// Tokens are stored and compared only by this hash; the raw token
/// never reaches the store.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
