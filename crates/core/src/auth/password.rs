//! Password digests.
//!
//! Stored passwords are a SHA-256 digest of the password with a fixed pepper
//! appended, written as lowercase hex. Every client that shares the user list
//! computes the same digest, so the scheme cannot change without migrating
//! the stored users.

use sha2::{Digest, Sha256};

const PEPPER: &str = "T1T_SYSTEM_SECURE_2026_!@#";

/// Computes the stored digest of a password.
///
/// An empty password yields an empty digest, which never verifies.
///
/// # Example
///
/// ```
/// use shiftbook_core::auth::hash_password;
///
/// let digest = hash_password("2026");
/// assert_eq!(digest.len(), 64);
/// assert!(hash_password("").is_empty());
/// ```
#[must_use]
pub fn hash_password(password: &str) -> String {
    if password.is_empty() {
        return String::new();
    }
    let digest = Sha256::new()
        .chain_update(password.as_bytes())
        .chain_update(PEPPER.as_bytes())
        .finalize();
    hex::encode(digest)
}

/// Verifies a password against a stored digest.
#[must_use]
pub fn verify_password(password: &str, digest: &str) -> bool {
    !digest.is_empty() && hash_password(password) == digest
}

/// Returns true if the value looks like a stored digest.
#[must_use]
pub fn is_digest(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
