//! Symmetric bearer-token codec.
//!
//! # Responsibility
//! - Encrypt an account identity into an opaque, transport-safe token.
//! - Decrypt a presented token back into the identity.
//!
//! # Invariants
//! - Token layout is `base64url_nopad(nonce || ciphertext || tag)`.
//! - A fresh 96-bit nonce is drawn per `encode`, so tokens for the same
//!   identity differ between calls.
//! - Tokens carry no expiry or scope; authenticity is bounded by possession
//!   of the key and the AES-GCM tag.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Token codec failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Cipher refused to encrypt the identity.
    Encrypt,
    /// Token is not well-formed text/ciphertext (bad base64, truncated, not UTF-8).
    Malformed(&'static str),
    /// Authentication tag mismatch: corrupted token or a different key.
    Rejected,
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encrypt => write!(f, "token encryption failed"),
            Self::Malformed(reason) => write!(f, "malformed token: {reason}"),
            Self::Rejected => write!(f, "token rejected by cipher"),
        }
    }
}

impl Error for TokenError {}

/// Server-wide 256-bit symmetric key.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derives a key from a configured passphrase with SHA-256.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// AES-256-GCM codec bound to one server key.
#[derive(Clone)]
pub struct TokenCodec {
    cipher: Aes256Gcm,
}

impl TokenCodec {
    pub fn new(key: &SecretKey) -> Self {
        let key: &Key<Aes256Gcm> = key.as_bytes().into();
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypts `identity` into a URL-safe token string.
    pub fn encode(&self, identity: &str) -> Result<String, TokenError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, identity.as_bytes())
            .map_err(|_| TokenError::Encrypt)?;

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(nonce.as_slice());
        raw.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Decrypts a token produced by [`TokenCodec::encode`] under the same key.
    pub fn decode(&self, token: &str) -> Result<String, TokenError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| TokenError::Malformed("not base64url"))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(TokenError::Malformed("truncated"));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| TokenError::Rejected)?;
        String::from_utf8(plaintext).map_err(|_| TokenError::Malformed("identity is not utf-8"))
    }
}

impl Debug for TokenCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenCodec { cipher: \"aes-256-gcm\" }")
    }
}

#[cfg(test)]
mod tests {
    use super::{SecretKey, TokenCodec, TokenError};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use proptest::prelude::*;

    fn codec(passphrase: &str) -> TokenCodec {
        TokenCodec::new(&SecretKey::from_passphrase(passphrase))
    }

    #[test]
    fn encode_is_not_deterministic() {
        let codec = codec("server-secret");
        let first = codec.encode("account-1").unwrap();
        let second = codec.encode("account-1").unwrap();
        assert_ne!(first, second);
        assert_eq!(codec.decode(&first).unwrap(), "account-1");
        assert_eq!(codec.decode(&second).unwrap(), "account-1");
    }

    #[test]
    fn token_is_url_safe_text() {
        let token = codec("server-secret").encode("account-1").unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = codec("server-secret").encode("account-1").unwrap();
        let err = codec("other-secret").decode(&token).unwrap_err();
        assert_eq!(err, TokenError::Rejected);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = codec("server-secret").decode("%%% not a token %%%").unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[test]
    fn padded_token_is_malformed() {
        let codec = codec("server-secret");
        let token = codec.encode("account-1").unwrap();
        for padded in [format!("  {token}"), format!("{token}\n"), format!("{token} ")] {
            let err = codec.decode(&padded).unwrap_err();
            assert!(matches!(err, TokenError::Malformed(_)), "{padded:?}");
        }
    }

    #[test]
    fn truncated_token_is_malformed() {
        let short = URL_SAFE_NO_PAD.encode([0u8; 20]);
        let err = codec("server-secret").decode(&short).unwrap_err();
        assert_eq!(err, TokenError::Malformed("truncated"));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = codec("server-secret");
        let token = codec.encode("account-1").unwrap();
        let mut raw = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let err = codec.decode(&URL_SAFE_NO_PAD.encode(raw)).unwrap_err();
        assert_eq!(err, TokenError::Rejected);
    }

    #[test]
    fn secret_key_debug_is_redacted() {
        let rendered = format!("{:?}", SecretKey::from_bytes([7u8; 32]));
        assert_eq!(rendered, "SecretKey(<redacted>)");
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(identity in ".{0,64}", key in proptest::array::uniform32(any::<u8>())) {
            let codec = TokenCodec::new(&SecretKey::from_bytes(key));
            let token = codec.encode(&identity).unwrap();
            prop_assert_eq!(codec.decode(&token).unwrap(), identity);
        }

        #[test]
        fn random_bytes_never_decode(bytes in proptest::collection::vec(any::<u8>(), 0..96)) {
            let codec = codec("server-secret");
            let token = URL_SAFE_NO_PAD.encode(bytes);
            prop_assert!(codec.decode(&token).is_err());
        }
    }
}
