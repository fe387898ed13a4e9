//! SQLite storage bootstrap for the memory table.
//!
//! # Responsibility
//! - Open and configure the single process-wide SQLite connection.
//! - Bring the `memories` schema up to date before any read or write.
//! - Tell lock contention apart from other engine faults.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No memory row is touched before migrations succeed.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, IN_MEMORY_PATH};

/// How long a statement waits on another process's file lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The database file could not be opened or created.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// Another connection kept the file locked past [`BUSY_TIMEOUT`].
    Busy(rusqlite::Error),
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build of the server.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    pub(crate) fn open(target: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Open {
            target: target.into(),
            source,
        }
    }

    /// Whether retrying later could succeed.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => {
                write!(f, "cannot open memory database `{target}`: {source}")
            }
            Self::Busy(err) => write!(
                f,
                "memory database is locked by another connection (waited {}s): {err}",
                BUSY_TIMEOUT.as_secs()
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "memory database schema version {db_version} was written by a newer server \
                 (this build supports up to {latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Busy(err) | Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::Busy(value),
            _ => Self::Sqlite(value),
        }
    }
}
