//! YAML application configuration.
//!
//! # Responsibility
//! - Load the server secret, database location, hashing cost and logging
//!   settings from one YAML file.
//! - Resolve the config file path from `CONFIG_FILE`.
//!
//! # Invariants
//! - The secret key is non-empty; it is only ever exposed as a derived
//!   `SecretKey`.
//! - Config is loaded once at process start and passed down explicitly.

use crate::crypto::{SecretKey, WorkFactor};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";
/// Config file used when `CONFIG_FILE` is unset or blank.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_yaml::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config yaml: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Parse(value)
    }
}

/// Root application config.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub secret: SecretConfig,
    #[serde(rename = "db")]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub hashing: WorkFactor,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize)]
pub struct SecretConfig {
    pub key: String,
}

impl Debug for SecretConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretConfig { key: <redacted> }")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`; build default when unset.
    pub level: Option<String>,
    /// Absolute log directory; file logging stays off when unset.
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Parses and validates config from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Derives the server-wide token key from the configured secret.
    pub fn secret_key(&self) -> SecretKey {
        SecretKey::from_passphrase(&self.secret.key)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.key.trim().is_empty() {
            return Err(ConfigError::Invalid("secret.key must not be empty"));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db.path must not be empty"));
        }
        Ok(())
    }
}

/// Reads and validates the config file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_yaml_str(&text)
}

/// Returns `CONFIG_FILE` when set and non-blank, else `config.yml`.
pub fn config_path_from_env() -> PathBuf {
    match std::env::var(CONFIG_FILE_ENV) {
        Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw.trim()),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

#[cfg(test)]
mod tests {
    use super::{load_config, AppConfig, ConfigError};
    use crate::crypto::{SecretKey, WorkFactor};
    use std::io::Write;

    const FULL: &str = "
secret:
  key: change-me
db:
  path: /var/lib/passport/passport.sqlite3
hashing:
  memory_kib: 8
  iterations: 1
  parallelism: 1
logging:
  level: warn
  dir: /var/log/passport
";

    #[test]
    fn parses_full_config() {
        let config = AppConfig::from_yaml_str(FULL).unwrap();
        assert_eq!(
            config.database.path.to_str(),
            Some("/var/lib/passport/passport.sqlite3")
        );
        assert_eq!(config.hashing.iterations, 1);
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
        assert_eq!(config.secret_key(), SecretKey::from_passphrase("change-me"));
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let config =
            AppConfig::from_yaml_str("secret:\n  key: k\ndb:\n  path: passport.db\n").unwrap();
        assert_eq!(config.hashing, WorkFactor::default());
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let err = AppConfig::from_yaml_str("secret:\n  key: '  '\ndb:\n  path: passport.db\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_secret_section_is_a_parse_error() {
        let err = AppConfig::from_yaml_str("db:\n  path: passport.db\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = AppConfig::from_yaml_str(FULL).unwrap();
        assert!(!format!("{config:?}").contains("change-me"));
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.secret.key, "change-me");
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
