//! SHA-256 content addressing.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Whether `reference` has the shape of a [`sha256_hex`] digest.
pub fn is_sha256_hex(reference: &str) -> bool {
    reference.len() == 64
        && reference
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
