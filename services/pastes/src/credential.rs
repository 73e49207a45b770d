//! Password hashing and verification
//!
//! Hashes are Argon2id PHC strings: algorithm, version, cost parameters and
//! salt travel inside the string, so verification needs nothing else.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::warn;

/// Password hashing failure
#[derive(Error, Debug)]
#[error("Failed to hash password: {0}")]
pub struct HashError(String);

/// Hash a plaintext password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| HashError(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Check a candidate password against a stored hash
///
/// The digest comparison is constant-time. A mismatch is `false`, and so is a
/// stored hash that does not parse.
pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed_hash)
        .is_ok()
}
