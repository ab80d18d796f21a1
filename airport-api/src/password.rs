//! Argon2id password hashing. Hashes are stored as PHC strings, so the salt
//! and parameters travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Hashes on the blocking pool; argon2 is deliberately slow.
pub async fn hash_in_background(password: String) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password)).await?;
    hash.map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))
}

pub async fn verify_in_background(password: String, hash: String) -> anyhow::Result<bool> {
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?;
    verified.map_err(|e| anyhow::anyhow!("stored password hash is unreadable: {}", e))
}
