//! Salt generation and salted PIN digests.
//!
//! The digest scheme is a single-round SHA-256 over the UTF-8 concatenation
//! of PIN and salt, hex encoded lowercase. The scheme is fixed by the records
//! already written by other devices; see the crate docs for its limits.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Number of random bytes in a freshly generated salt.
const SALT_BYTES: usize = 16;

/// Generates a fresh salt from the OS CSPRNG, lowercase hex encoded
/// (32 characters).
#[must_use]
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    hex::encode(salt)
}

/// Computes the lowercase hex SHA-256 digest of `pin || salt`.
#[must_use]
pub fn pin_digest(pin: &str, salt: &str) -> String {
    let mut material = Zeroizing::new(Vec::with_capacity(pin.len() + salt.len()));
    material.extend_from_slice(pin.as_bytes());
    material.extend_from_slice(salt.as_bytes());
    hex::encode(Sha256::digest(material.as_slice()))
}

/// Compares two hex digests in constant time.
#[must_use]
pub fn digests_match(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}
