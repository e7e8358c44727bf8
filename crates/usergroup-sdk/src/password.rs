//! Password hashing for the login request.
//!
//! The backend never receives a plain password: the client sends the
//! lowercase hex SHA-256 digest as `password_hash`.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `password`.
///
/// # Examples
///
/// ```
/// use usergroup_sdk::password_hash;
///
/// assert_eq!(
///     password_hash("abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
/// );
/// ```
pub fn password_hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
