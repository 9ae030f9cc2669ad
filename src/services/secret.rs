// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret hashing and verification.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lowercase hex SHA-256 of the secret's UTF-8 bytes.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Check a plaintext candidate against a stored hex digest.
///
/// The stored digest is matched case-insensitively; the comparison itself
/// runs in constant time.
pub fn verify_secret(candidate: &str, stored_hash: &str) -> bool {
    let computed = hash_secret(candidate);
    let stored = stored_hash.trim().to_ascii_lowercase();
    computed.as_bytes().ct_eq(stored.as_bytes()).into()
}
