//! Argon2id credential hashing.
//!
//! # Responsibility
//! - Produce salted PHC-format hashes for new passwords.
//! - Verify candidate passwords against stored hashes.
//!
//! # Invariants
//! - Every `hash` call draws a fresh random salt from the OS.
//! - Mismatch is `Ok(false)`, never an error.
//! - Verification reads cost parameters from the stored hash, so raising the
//!   work factor does not invalidate existing credentials.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Failures of the hashing primitive itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Work factor values outside the primitive's accepted range.
    InvalidWorkFactor(String),
    /// Hash computation failed (entropy or resource exhaustion).
    Hash(String),
    /// Stored hash is not a parseable PHC string.
    MalformedHash(String),
}

impl Display for HashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWorkFactor(message) => write!(f, "invalid work factor: {message}"),
            Self::Hash(message) => write!(f, "password hashing failed: {message}"),
            Self::MalformedHash(message) => write!(f, "malformed password hash: {message}"),
        }
    }
}

impl Error for HashError {}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkFactor {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for WorkFactor {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Password hasher bound to one work factor.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Builds a hasher, rejecting out-of-range cost parameters.
    pub fn new(work_factor: WorkFactor) -> Result<Self, HashError> {
        let params = Params::new(
            work_factor.memory_kib,
            work_factor.iterations,
            work_factor.parallelism,
            None,
        )
        .map_err(|err| HashError::InvalidWorkFactor(err.to_string()))?;
        Ok(Self { params })
    }

    /// Hashes `plaintext` with a fresh salt and returns the PHC string.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| HashError::Hash(err.to_string()))
    }

    /// Verifies `plaintext` against a stored PHC hash in constant time.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| HashError::MalformedHash(err.to_string()))?;

        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(HashError::MalformedHash(err.to_string())),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Debug for CredentialHasher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("memory_kib", &self.params.m_cost())
            .field("iterations", &self.params.t_cost())
            .field("parallelism", &self.params.p_cost())
            .finish()
    }
}
