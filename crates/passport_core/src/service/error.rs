//! Error taxonomy shared by account services.

use crate::crypto::{HashError, TokenError};
use crate::repo::account_repo::RepoError;
use crate::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason an authentication attempt or token was refused.
///
/// The variants stay distinct for operator logs; boundaries decide how much of
/// the distinction callers get to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    UserNotFound,
    IncorrectPassword,
    InvalidTokenType,
    InvalidToken,
}

impl AuthFailure {
    /// Stable snake_case code for log events.
    pub fn code(self) -> &'static str {
        match self {
            Self::UserNotFound => "user_not_found",
            Self::IncorrectPassword => "incorrect_password",
            Self::InvalidTokenType => "invalid_token_type",
            Self::InvalidToken => "invalid_token",
        }
    }
}

impl Display for AuthFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound => write!(f, "user not found"),
            Self::IncorrectPassword => write!(f, "incorrect password"),
            Self::InvalidTokenType => write!(f, "invalid token type"),
            Self::InvalidToken => write!(f, "invalid token"),
        }
    }
}

/// Caller-visible outcome category of a service error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; storage was never touched.
    BadRequest,
    /// Bad credentials, unusable token or unknown account.
    Unauthorized,
    /// Write rejected by a uniqueness rule.
    Conflict,
    /// Unexpected storage or crypto failure.
    Internal,
}

/// Service error for register / login / resolve use cases.
#[derive(Debug)]
pub enum AuthServiceError {
    Validation(ValidationError),
    Unauthorized(AuthFailure),
    UsernameTaken(String),
    Store(RepoError),
    Hashing(HashError),
    /// Token could not be minted. Decode failures are `Unauthorized`.
    Token(TokenError),
}

impl AuthServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::BadRequest,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::UsernameTaken(_) => ErrorKind::Conflict,
            Self::Store(_) | Self::Hashing(_) | Self::Token(_) => ErrorKind::Internal,
        }
    }
}

impl Display for AuthServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Unauthorized(reason) => write!(f, "unauthorized: {reason}"),
            Self::UsernameTaken(username) => write!(f, "username already taken: {username}"),
            Self::Store(err) => write!(f, "store failure: {err}"),
            Self::Hashing(err) => write!(f, "{err}"),
            Self::Token(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Hashing(err) => Some(err),
            Self::Token(err) => Some(err),
            Self::Unauthorized(_) | Self::UsernameTaken(_) => None,
        }
    }
}

impl From<ValidationError> for AuthServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for AuthServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UsernameTaken(username) => Self::UsernameTaken(username),
            other => Self::Store(other),
        }
    }
}

impl From<HashError> for AuthServiceError {
    fn from(value: HashError) -> Self {
        Self::Hashing(value)
    }
}

impl From<TokenError> for AuthServiceError {
    fn from(value: TokenError) -> Self {
        Self::Token(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthFailure, AuthServiceError, ErrorKind};
    use crate::repo::account_repo::RepoError;
    use crate::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn username_conflicts_are_lifted_out_of_store_errors() {
        let err = AuthServiceError::from(RepoError::UsernameTaken("alice123".to_string()));
        assert!(matches!(err, AuthServiceError::UsernameTaken(ref name) if name == "alice123"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn other_store_errors_are_internal() {
        let err = AuthServiceError::from(RepoError::DuplicateId(Uuid::new_v4()));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            AuthServiceError::from(ValidationError::InvalidPassword).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            AuthServiceError::Unauthorized(AuthFailure::InvalidToken).kind(),
            ErrorKind::Unauthorized
        );
    }
}
