//! Core account identity logic for passport.
//! Registration, login and bearer-token resolution over a SQLite store.

pub mod config;
pub mod crypto;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{config_path_from_env, load_config, AppConfig, ConfigError};
pub use crypto::{CredentialHasher, HashError, SecretKey, TokenCodec, TokenError, WorkFactor};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::account::{Account, AccountId, AccountProfile, Credential};
pub use repo::account_repo::{
    AccountStore, RepoError, RepoResult, SqliteAccountStore, SqliteStoreTransaction,
    StoreTransaction,
};
pub use service::authentication_service::AuthenticationService;
pub use service::error::{AuthFailure, AuthServiceError, ErrorKind};
pub use service::registration_service::{RegistrationRequest, RegistrationService};
pub use service::session_resolver::{SessionResolver, BEARER_PREFIX};
pub use validation::{validate_credentials, ValidationError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
