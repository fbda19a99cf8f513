//! Password hashing.
//!
//! Passwords are stored as Argon2id PHC strings. Hashing is CPU-bound, so the
//! async wrappers move it onto the blocking thread pool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

/// Errors from hashing or verifying a password.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Hashing failed or a stored hash could not be parsed.
    #[error("Password hash error: {0}")]
    Hash(String),

    /// The blocking task panicked or was cancelled.
    #[error("Credential task failed: {0}")]
    Task(String),
}

/// Hashes `password` with a fresh random salt.
///
/// # Errors
///
/// Returns `CredentialError::Hash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|error| CredentialError::Hash(error.to_string()))
}

/// Checks `password` against a stored PHC string.
///
/// # Errors
///
/// Returns `CredentialError::Hash` if `stored_hash` is not a valid PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, CredentialError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|error| CredentialError::Hash(error.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(error) => Err(CredentialError::Hash(error.to_string())),
    }
}

/// Runs [`hash_password`] on the blocking thread pool.
///
/// # Errors
///
/// Returns `CredentialError` if hashing fails or the task does not complete.
pub async fn hash_password_blocking(password: String) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|error| CredentialError::Task(error.to_string()))?
}

/// Runs [`verify_password`] on the blocking thread pool.
///
/// # Errors
///
/// Returns `CredentialError` if the stored hash is malformed or the task does not complete.
pub async fn verify_password_blocking(
    password: String,
    stored_hash: String,
) -> Result<bool, CredentialError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|error| CredentialError::Task(error.to_string()))?
}
