//! Account and credential records.
//!
//! # Responsibility
//! - Define the canonical account/credential pair created at registration.
//! - Provide the profile projection that is safe to return to callers.
//!
//! # Invariants
//! - `id` is generated once and never reused for another account.
//! - A credential is keyed by its account id (1:1).
//! - `password_hash` never leaves core through `Debug` or the profile view.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use uuid::Uuid;

/// Stable identifier for an account and its credential.
pub type AccountId = Uuid;

/// Profile record of a registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub first_name: String,
    /// Citizen/national identification number. Never projected to callers.
    pub national_id: String,
    pub age: i64,
    /// Unix epoch milliseconds, assigned by the store on insert.
    pub created_at: i64,
    /// Unix epoch milliseconds, assigned by the store on write.
    pub updated_at: i64,
    /// Soft delete tombstone. `Some` rows are invisible to lookups.
    pub deleted_at: Option<i64>,
}

impl Account {
    /// Creates a new account with a generated stable ID and `age = 0`.
    ///
    /// Timestamps stay zero until the store assigns them on insert.
    pub fn new(
        name: impl Into<String>,
        first_name: impl Into<String>,
        national_id: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), name, first_name, national_id)
    }

    /// Creates a new account with a caller-provided ID.
    pub fn with_id(
        id: AccountId,
        name: impl Into<String>,
        first_name: impl Into<String>,
        national_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            first_name: first_name.into(),
            national_id: national_id.into(),
            age: 0,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    /// Returns whether this account should be considered visible/active.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Projects the caller-safe profile view.
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            name: self.name.clone(),
            first_name: self.first_name.clone(),
            age: self.age,
            created_at: self.created_at,
        }
    }
}

/// Login credential bound 1:1 to an account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub account_id: AccountId,
    pub username: String,
    /// PHC-formatted hasher output, never the plaintext password.
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl Credential {
    /// Creates a credential for `account_id` from an already hashed password.
    pub fn new(
        account_id: AccountId,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("account_id", &self.account_id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("deleted_at", &self.deleted_at)
            .finish()
    }
}

/// Public account view returned by session resolution.
///
/// Deliberately excludes `national_id` and every credential field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: AccountId,
    pub name: String,
    pub first_name: String,
    pub age: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{Account, Credential};

    #[test]
    fn new_account_defaults_age_to_zero_and_is_active() {
        let account = Account::new("Alice", "Alice", "123456");
        assert_eq!(account.age, 0);
        assert!(account.is_active());
    }

    #[test]
    fn new_accounts_get_distinct_ids() {
        let first = Account::new("a", "a", "1");
        let second = Account::new("a", "a", "1");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn profile_projection_carries_public_fields_only() {
        let mut account = Account::new("Alice", "Alice", "123456");
        account.created_at = 1_700_000_000_000;
        let profile = account.profile();
        assert_eq!(profile.id, account.id);
        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.created_at, 1_700_000_000_000);

        let rendered = format!("{profile:?}");
        assert!(!rendered.contains("123456"));
    }

    #[test]
    fn credential_debug_redacts_password_hash() {
        let account = Account::new("Alice", "Alice", "123456");
        let credential = Credential::new(account.id, "alice123", "$argon2id$v=19$secret");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("alice123"));
        assert!(!rendered.contains("argon2id"));
    }
}
