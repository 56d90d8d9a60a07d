//! Account registration use-case service.
//!
//! # Responsibility
//! - Validate registration input before any storage access.
//! - Create the account and its credential as one atomic unit.
//!
//! # Invariants
//! - The password is hashed before the transaction opens.
//! - Any insert failure rolls back both records; the id is returned only
//!   after commit.

use crate::crypto::CredentialHasher;
use crate::model::account::{Account, AccountId, Credential};
use crate::repo::account_repo::{AccountStore, StoreTransaction};
use crate::service::error::AuthServiceError;
use crate::validation::validate_credentials;
use log::{error, info, warn};
use std::fmt::{Debug, Formatter};
use std::time::Instant;

/// Input for a new account registration.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub name: String,
    pub first_name: String,
    pub national_id: String,
    pub username: String,
    pub password: String,
}

impl Debug for RegistrationRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("name", &self.name)
            .field("first_name", &self.first_name)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Registration service over an injected store and hasher.
pub struct RegistrationService<S: AccountStore> {
    store: S,
    hasher: CredentialHasher,
}

impl<S: AccountStore> RegistrationService<S> {
    pub fn new(store: S, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    /// Registers a new account and returns its id after commit.
    ///
    /// # Errors
    /// - `Validation` for a malformed username or password (no store access).
    /// - `UsernameTaken` when an active credential already uses the username.
    /// - `Hashing` / `Store` for unexpected primitive or persistence failures.
    pub fn register(&self, request: &RegistrationRequest) -> Result<AccountId, AuthServiceError> {
        let started_at = Instant::now();

        if let Err(err) = validate_credentials(&request.username, &request.password) {
            info!(
                "event=account_register module=service status=rejected field={}",
                err.field()
            );
            return Err(err.into());
        }

        let account = Account::new(
            request.name.as_str(),
            request.first_name.as_str(),
            request.national_id.as_str(),
        );
        let password_hash = self.hasher.hash(&request.password).map_err(|err| {
            error!(
                "event=account_register module=service status=error error_code=hash_failed error={}",
                err
            );
            err
        })?;
        let credential = Credential::new(account.id, request.username.as_str(), password_hash);

        let tx = self.store.begin().map_err(|err| {
            error!(
                "event=account_register module=service status=error error_code=tx_begin_failed error={}",
                err
            );
            err
        })?;

        let written = tx
            .insert_account(&account)
            .and_then(|()| tx.insert_credential(&credential));
        if let Err(err) = written {
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event=account_register module=service status=error error_code=rollback_failed error={}",
                    rollback_err
                );
            }
            let err = AuthServiceError::from(err);
            match &err {
                AuthServiceError::UsernameTaken(_) => warn!(
                    "event=account_register module=service status=conflict account_id={}",
                    account.id
                ),
                other => error!(
                    "event=account_register module=service status=error error_code=insert_failed account_id={} error={}",
                    account.id, other
                ),
            }
            return Err(err);
        }

        tx.commit().map_err(|err| {
            error!(
                "event=account_register module=service status=error error_code=commit_failed error={}",
                err
            );
            err
        })?;

        info!(
            "event=account_register module=service status=ok account_id={} duration_ms={}",
            account.id,
            started_at.elapsed().as_millis()
        );
        Ok(account.id)
    }
}
