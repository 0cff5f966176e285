//! Password hashing (argon2id)
//!
//! Hashes are stored in PHC string format, salt included. Hashing and
//! verification run on the blocking pool so a slow hash never stalls the
//! request executor.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Password hashing service
pub struct PasswordService;

impl PasswordService {
    fn hash_blocking(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
    }

    fn verify_blocking(password: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Hash a plaintext password
    pub async fn hash(password: String) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash_blocking(&password))
            .await
            .context("password hashing task failed")?
    }

    /// Check a plaintext password against a stored hash
    pub async fn verify(password: String, stored_hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify_blocking(&password, &stored_hash))
            .await
            .context("password verification task failed")?
    }
}
