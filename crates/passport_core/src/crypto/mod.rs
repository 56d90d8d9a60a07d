//! Cryptographic primitives for credentials and bearer tokens.
//!
//! # Responsibility
//! - One-way password hashing with a tunable work factor.
//! - Symmetric, reversible encoding of an account identity into a token.
//!
//! # Invariants
//! - Plaintext passwords, hashes and key material are never logged.

pub mod hasher;
pub mod token;

pub use hasher::{CredentialHasher, HashError, WorkFactor};
pub use token::{SecretKey, TokenCodec, TokenError};
