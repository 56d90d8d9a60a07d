//! Input shape rules shared by registration and login.
//!
//! # Invariants
//! - Usernames are lowercase ASCII alphanumerics, at least 4 characters.
//! - Passwords are at least 8 bytes; no other complexity rule applies.
//! - Validation never touches storage.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum accepted password length in bytes.
pub const PASSWORD_MIN_LEN: usize = 8;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]{4,}$").expect("valid username regex"));

/// Malformed caller input, naming the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidUsername,
    InvalidPassword,
}

impl ValidationError {
    /// Name of the rejected input field.
    pub fn field(self) -> &'static str {
        match self {
            Self::InvalidUsername => "username",
            Self::InvalidPassword => "password",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}", self.field())
    }
}

impl Error for ValidationError {}

/// Checks the username shape `^[a-z0-9]{4,}$`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername)
    }
}

/// Checks the minimum password length.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() >= PASSWORD_MIN_LEN {
        Ok(())
    } else {
        Err(ValidationError::InvalidPassword)
    }
}

/// Validates a username/password pair, username first.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_password(password)
}

#[cfg(test)]
mod tests {
    use super::{validate_credentials, validate_password, validate_username, ValidationError};
    use proptest::prelude::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice123").is_ok());
        assert!(validate_username("abcd").is_ok());
        assert_eq!(
            validate_username("ab"),
            Err(ValidationError::InvalidUsername)
        );
        assert!(validate_username("Alice123").is_err());
        assert!(validate_username("alice_123").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn password_rules() {
        assert_eq!(
            validate_password("short1"),
            Err(ValidationError::InvalidPassword)
        );
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn username_is_checked_before_password() {
        let err = validate_credentials("ab", "short").expect_err("both invalid");
        assert_eq!(err.field(), "username");
        assert_eq!(err.to_string(), "invalid username");
    }

    proptest! {
        #[test]
        fn lowercase_alphanumerics_of_length_four_or_more_pass(name in "[a-z0-9]{4,24}") {
            prop_assert!(validate_username(&name).is_ok());
        }

        #[test]
        fn names_shorter_than_four_fail(name in "[a-z0-9]{0,3}") {
            prop_assert!(validate_username(&name).is_err());
        }

        #[test]
        fn names_with_other_characters_fail(prefix in "[a-z0-9]{2}", bad in "[A-Z_ .@-]", suffix in "[a-z0-9]{2}") {
            let name = format!("{prefix}{bad}{suffix}");
            prop_assert!(validate_username(&name).is_err());
        }
    }
}
