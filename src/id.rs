//! Opaque identifier generation and stable hashing.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generates a fresh opaque identifier (32 lowercase hex characters).
pub fn new_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Stable 64-bit hash of a string.
///
/// Unlike `std::hash`, the result never changes between builds or
/// platforms, so it can be used to bucket persisted identifiers.
pub fn stable_hash(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Hex-encoded SHA-256 of a string, truncated to `len` characters.
pub fn opaque_digest(input: &str, len: usize) -> String {
    let mut encoded = hex::encode(Sha256::digest(input.as_bytes()));
    encoded.truncate(len);
    encoded
}
