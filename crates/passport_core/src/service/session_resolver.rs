//! Bearer-token session resolution.
//!
//! # Responsibility
//! - Turn an `Authorization` header value back into an account profile.
//!
//! # Invariants
//! - Only headers starting with the literal `"Bearer "` are considered.
//! - The returned profile never includes `national_id` or credential data.

use crate::crypto::TokenCodec;
use crate::model::account::{AccountId, AccountProfile};
use crate::repo::account_repo::AccountStore;
use crate::service::error::{AuthFailure, AuthServiceError};
use log::{debug, error};
use uuid::Uuid;

/// Required prefix of an `Authorization` header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Resolver over an injected store and token codec.
pub struct SessionResolver<S: AccountStore> {
    store: S,
    codec: TokenCodec,
}

impl<S: AccountStore> SessionResolver<S> {
    pub fn new(store: S, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    /// Resolves `Authorization: Bearer <token>` to the account profile.
    pub fn resolve(&self, bearer_header: &str) -> Result<AccountProfile, AuthServiceError> {
        let token = bearer_header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthServiceError::Unauthorized(AuthFailure::InvalidTokenType))?;

        let identity = self.codec.decode(token).map_err(|err| {
            debug!(
                "event=session_resolve module=service status=unauthorized reason=invalid_token error={}",
                err
            );
            AuthServiceError::Unauthorized(AuthFailure::InvalidToken)
        })?;
        let account_id = Uuid::parse_str(&identity)
            .map_err(|_| AuthServiceError::Unauthorized(AuthFailure::InvalidToken))?;

        self.profile(account_id)
    }

    /// Loads the profile of an active account by id.
    pub fn profile(&self, account_id: AccountId) -> Result<AccountProfile, AuthServiceError> {
        match self.store.find_account_by_id(account_id) {
            Ok(Some(account)) => Ok(account.profile()),
            Ok(None) => Err(AuthServiceError::Unauthorized(AuthFailure::UserNotFound)),
            Err(err) => {
                error!(
                    "event=session_resolve module=service status=error error_code=lookup_failed account_id={} error={}",
                    account_id, err
                );
                Err(AuthServiceError::Store(err))
            }
        }
    }
}
