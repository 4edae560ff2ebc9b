//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...,t=...,p=1$...`),
//! so verification reads its cost parameters from the stored hash and keeps
//! working after the configured costs change.

use crate::config::PasswordSettings;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Minimum accepted password length in characters.
pub const PASSWORD_MIN_CHARS: usize = 8;

const UNKNOWN_USER_PASSWORD: &str = "notekeeper-unknown-user";

/// Configured Argon2id hasher.
#[derive(Clone)]
pub struct Credentials {
    hasher: Argon2<'static>,
    /// Hash checked when the username does not exist. Built on first use.
    unknown_user_hash: Arc<OnceCell<String>>,
}

impl Credentials {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, argon2::Error> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)?;
        Ok(Self::with_hasher(Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            params,
        )))
    }

    fn with_hasher(hasher: Argon2<'static>) -> Self {
        Self {
            hasher,
            unknown_user_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn from_settings(settings: &PasswordSettings) -> Result<Self, argon2::Error> {
        Self::new(settings.memory_kib, settings.iterations)
    }

    /// Hashes `password` with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .hasher
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// `Ok(false)` on mismatch, `Err` only when `hash` is not a PHC string.
    pub fn verify_password(
        &self,
        password: &str,
        hash: &str,
    ) -> Result<bool, argon2::password_hash::Error> {
        let parsed = PasswordHash::new(hash)?;
        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Check for a username that does not exist. Costs one full
    /// verification, like [`Credentials::verify_password`], and is always
    /// `Ok(false)`.
    pub fn verify_unknown_user(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        let hash = self
            .unknown_user_hash
            .get_or_try_init(|| self.hash_password(UNKNOWN_USER_PASSWORD))?;
        self.verify_password(password, hash)?;
        Ok(false)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::with_hasher(Argon2::default())
    }
}
