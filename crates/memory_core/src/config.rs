//! Environment-driven server configuration.
//!
//! # Responsibility
//! - Resolve database path and logging settings from environment values.
//! - Reject unusable settings before any storage is opened.
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - Resolution is pure over the lookup function; only `from_env` reads the
//!   process environment.

use crate::logging::{default_log_level, normalize_level, LogTarget};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "MEMORY_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "MEMORY_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "MEMORY_LOG_DIR";
pub const DEFAULT_DB_PATH: &str = "./memory.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(reason) => write!(f, "{LOG_LEVEL_ENV}: {reason}"),
            Self::RelativeLogDir(dir) => write!(
                f,
                "{LOG_DIR_ENV} must be an absolute path, got `{}`",
                dir.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved settings for one server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// SQLite file, or `:memory:`.
    pub db_path: PathBuf,
    /// Canonical level name (`trace|debug|info|warn|error`).
    pub log_level: &'static str,
    /// Rotated-file directory; `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Reads `MEMORY_DB_PATH`, `MEMORY_LOG_LEVEL` and `MEMORY_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path =
            PathBuf::from(read(DB_PATH_ENV).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()));

        let log_level = match read(LOG_LEVEL_ENV) {
            Some(level) => normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        let log_dir = match read(LOG_DIR_ENV).map(PathBuf::from) {
            Some(dir) if !dir.is_absolute() => return Err(ConfigError::RelativeLogDir(dir)),
            other => other,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }

    pub fn log_target(&self) -> LogTarget {
        match &self.log_dir {
            Some(dir) => LogTarget::Directory(dir.clone()),
            None => LogTarget::Stderr,
        }
    }
}
