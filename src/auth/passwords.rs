//! Credential hashing
//!
//! New credentials are hashed with Argon2id and a per-account random salt;
//! the PHC string stores salt and work factors next to the hash. Unsalted
//! SHA-256 hex digests left by older stores still verify so they can be
//! upgraded on the next successful login.

use argon2::{
    Algorithm, Argon2, ParamsBuilder, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::HashingConfig;
use crate::error::StoreError;

const SALT_LEN: usize = 16;
const LEGACY_HEX_LEN: usize = 64;

/// Verified against when the account does not exist, so both failure paths cost the same
const DUMMY_CREDENTIAL: &str = "operator-accounts/timing-equalizer";

#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    dummy_hash: Arc<str>,
}

impl PasswordService {
    pub fn new(config: &HashingConfig) -> Result<Self, StoreError> {
        let mut builder = ParamsBuilder::new();
        builder.m_cost(config.memory_kib);
        builder.t_cost(config.iterations);
        builder.p_cost(config.parallelism);
        let params = builder.build()?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut service = Self {
            argon2,
            dummy_hash: Arc::from(""),
        };
        service.dummy_hash = Arc::from(service.hash_password(DUMMY_CREDENTIAL)?);
        Ok(service)
    }

    pub fn hash_password(&self, password: &str) -> Result<String, StoreError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)?
            .to_string();
        Ok(hash)
    }

    /// Checks `password` against a stored Argon2 PHC string or legacy SHA-256 digest
    pub fn verify_password(&self, password: &str, encoded: &str) -> Result<bool, StoreError> {
        if is_legacy_hash(encoded) {
            let candidate = format!("{:x}", Sha256::digest(password.as_bytes()));
            let expected = encoded.to_ascii_lowercase();
            let matched = constant_time_eq(candidate.as_bytes(), expected.as_bytes());
            if !matched {
                // A mismatch must cost one Argon2 verify, like an unknown username
                self.verify_absent(password);
            }
            return Ok(matched);
        }

        let parsed = PasswordHash::new(encoded)?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(StoreError::from(err)),
        }
    }

    /// Burns one verification for a username that does not exist
    pub fn verify_absent(&self, password: &str) {
        let _ = self.verify_password(password, &self.dummy_hash);
    }

    /// Whether a stored hash should be replaced with a fresh Argon2id hash
    pub fn needs_rehash(&self, encoded: &str) -> bool {
        is_legacy_hash(encoded)
    }

    /// `hash_password` on the blocking pool
    pub async fn hash_password_async(&self, password: &str) -> Result<String, StoreError> {
        let service = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || service.hash_password(&password)).await?
    }

    /// `verify_password` on the blocking pool
    pub async fn verify_password_async(
        &self,
        password: &str,
        encoded: &str,
    ) -> Result<bool, StoreError> {
        let service = self.clone();
        let password = password.to_owned();
        let encoded = encoded.to_owned();
        tokio::task::spawn_blocking(move || service.verify_password(&password, &encoded)).await?
    }

    /// `verify_absent` on the blocking pool
    pub async fn verify_absent_async(&self, password: &str) {
        let service = self.clone();
        let password = password.to_owned();
        let _ = tokio::task::spawn_blocking(move || service.verify_absent(&password)).await;
    }
}

fn is_legacy_hash(encoded: &str) -> bool {
    encoded.len() == LEGACY_HEX_LEN && encoded.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Constant-time comparison to avoid timing side-channels.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
