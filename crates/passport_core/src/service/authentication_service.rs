//! Login use-case service.
//!
//! # Responsibility
//! - Check a username/password pair against the stored credential.
//! - Mint a bearer token carrying the account id.
//!
//! # Invariants
//! - Unknown usernames and wrong passwords are `Unauthorized`; lookup
//!   failures are `Store`, never conflated with "not found".
//! - Verification runs after the store read has completed.

use crate::crypto::{CredentialHasher, TokenCodec};
use crate::repo::account_repo::AccountStore;
use crate::service::error::{AuthFailure, AuthServiceError};
use crate::validation::validate_credentials;
use log::{error, info, warn};
use std::time::Instant;

/// Login service over an injected store, hasher and token codec.
pub struct AuthenticationService<S: AccountStore> {
    store: S,
    hasher: CredentialHasher,
    codec: TokenCodec,
}

impl<S: AccountStore> AuthenticationService<S> {
    pub fn new(store: S, hasher: CredentialHasher, codec: TokenCodec) -> Self {
        Self {
            store,
            hasher,
            codec,
        }
    }

    /// Authenticates `username`/`password` and returns a bearer token.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthServiceError> {
        let started_at = Instant::now();

        if let Err(err) = validate_credentials(username, password) {
            info!(
                "event=account_login module=service status=rejected field={}",
                err.field()
            );
            return Err(err.into());
        }

        let credential = match self.store.find_credential_by_username(username) {
            Ok(Some(credential)) => credential,
            Ok(None) => return Err(refuse(AuthFailure::UserNotFound)),
            Err(err) => {
                error!(
                    "event=account_login module=service status=error error_code=lookup_failed error={}",
                    err
                );
                return Err(AuthServiceError::Store(err));
            }
        };

        match self.hasher.verify(password, &credential.password_hash) {
            Ok(true) => {}
            Ok(false) => return Err(refuse(AuthFailure::IncorrectPassword)),
            Err(err) => {
                error!(
                    "event=account_login module=service status=error error_code=verify_failed account_id={} error={}",
                    credential.account_id, err
                );
                return Err(err.into());
            }
        }

        let token = self
            .codec
            .encode(&credential.account_id.to_string())
            .map_err(|err| {
                error!(
                    "event=account_login module=service status=error error_code=token_encode_failed error={}",
                    err
                );
                err
            })?;

        info!(
            "event=account_login module=service status=ok account_id={} duration_ms={}",
            credential.account_id,
            started_at.elapsed().as_millis()
        );
        Ok(token)
    }
}

fn refuse(reason: AuthFailure) -> AuthServiceError {
    warn!(
        "event=account_login module=service status=unauthorized reason={}",
        reason.code()
    );
    AuthServiceError::Unauthorized(reason)
}
