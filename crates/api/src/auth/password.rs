//! Argon2id password hashing and verification.
//!
//! Hashes are stored in PHC string format so the algorithm parameters and
//! salt travel with the hash. Verification is CPU-bound and is run on the
//! blocking pool via [`matches`] when called from a request handler.

use std::sync::LazyLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::AppError;

/// Hash a plaintext password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted hash.
///
/// Returns `Ok(false)` on mismatch. A malformed stored hash is an `Err`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Hash compared against when the looked-up account does not exist, so an
/// unknown email costs the same as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("marquee-dummy-password").ok());

/// Async wrapper around [`verify_password`] that runs on the blocking pool.
///
/// `hash` of `None` verifies against a dummy hash and yields `Ok(false)`.
/// A malformed stored hash is an internal error, not a mismatch.
pub async fn matches(plaintext: String, hash: Option<String>) -> Result<bool, AppError> {
    let result = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&plaintext, &hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&plaintext, dummy);
            }
            Ok(false)
        }
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Password verification task failed: {e}")))?;

    result.map_err(|e| AppError::InternalError(format!("Stored password hash is malformed: {e}")))
}
