//! Transaction PIN hashing.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hashes a PIN using SHA-256, hex encoded.
pub fn hash_pin(pin: &str) -> String {
    let hash = Sha256::digest(pin.as_bytes());
    hex::encode(hash)
}

/// Verifies a PIN against a stored hash using constant-time comparison.
pub fn verify_pin(input: &str, stored_hash: &str) -> bool {
    let input_hash = hash_pin(input);
    input_hash.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
