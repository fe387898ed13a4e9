//! Memory repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide upsert / get / list-recent / delete over the `memories` table.
//! - Keep SQL text and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - `upsert_memory` never changes `created_at` of an existing key.
//! - `updated_at` never moves backwards and never precedes `created_at`.
//! - Listing order is `updated_at DESC, key ASC`.

use crate::db::DbError;
use crate::model::memory::{MemoryRecord, MemoryValidationError, NewMemory};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MEMORY_COLUMNS_SQL: &str = "key, value, metadata, created_at, updated_at";

// Millisecond resolution keeps consecutive writes distinguishable in
// `updated_at DESC` order.
const NOW_SQL: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for memory persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(MemoryValidationError),
    Db(DbError),
    InvalidQuery(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidQuery(message) => write!(f, "invalid memory query: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted memory data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidQuery(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<MemoryValidationError> for RepoError {
    fn from(value: MemoryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Options for listing memories, most recently updated first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryListQuery {
    /// Maximum rows to return; `None` scans the whole table. Must be > 0.
    pub limit: Option<u64>,
}

impl MemoryListQuery {
    pub fn with_limit(limit: u64) -> Self {
        Self { limit: Some(limit) }
    }
}

/// Storage primitives over memory records.
pub trait MemoryRepository {
    /// Inserts `memory` or overwrites the record with the same key.
    fn upsert_memory(&self, memory: &NewMemory) -> RepoResult<MemoryRecord>;
    /// Returns `Ok(None)` when no record exists for `key`.
    fn get_memory(&self, key: &str) -> RepoResult<Option<MemoryRecord>>;
    fn list_memories(&self, query: &MemoryListQuery) -> RepoResult<Vec<MemoryRecord>>;
    /// Returns the number of removed rows (0 or 1).
    fn delete_memory(&self, key: &str) -> RepoResult<usize>;
}

/// SQLite-backed memory repository borrowing the process-wide connection.
pub struct SqliteMemoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MemoryRepository for SqliteMemoryRepository<'_> {
    fn upsert_memory(&self, memory: &NewMemory) -> RepoResult<MemoryRecord> {
        memory.validate()?;

        let sql = format!(
            "INSERT INTO memories ({MEMORY_COLUMNS_SQL})
             VALUES (?1, ?2, ?3, {NOW_SQL}, {NOW_SQL})
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                metadata = excluded.metadata,
                created_at = COALESCE(memories.created_at, excluded.created_at),
                updated_at = MAX(
                    excluded.updated_at,
                    COALESCE(memories.updated_at, excluded.updated_at)
                )
             RETURNING {MEMORY_COLUMNS_SQL};"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let record = stmt.query_row(
            params![memory.key, memory.value, memory.stored_metadata()],
            parse_memory_row,
        )?;

        check_record(record)
    }

    fn get_memory(&self, key: &str) -> RepoResult<Option<MemoryRecord>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {MEMORY_COLUMNS_SQL}
             FROM memories
             WHERE key = ?1;"
        ))?;

        let record = stmt.query_row([key], parse_memory_row).optional()?;
        record.map(check_record).transpose()
    }

    fn list_memories(&self, query: &MemoryListQuery) -> RepoResult<Vec<MemoryRecord>> {
        // SQLite treats a negative LIMIT as "no limit", which keeps the
        // bounded and full scans on one statement.
        let limit = match query.limit {
            Some(0) => {
                return Err(RepoError::InvalidQuery(
                    "limit must be a positive integer".to_string(),
                ));
            }
            // Bounds past i64::MAX cannot be bound; they mean "everything".
            Some(limit) => i64::try_from(limit).unwrap_or(i64::MAX),
            None => -1,
        };

        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {MEMORY_COLUMNS_SQL}
             FROM memories
             ORDER BY updated_at DESC, key ASC
             LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([limit])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(check_record(parse_memory_row(row)?)?);
        }

        Ok(records)
    }

    fn delete_memory(&self, key: &str) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM memories WHERE key = ?1;", [key])?;
        Ok(removed)
    }
}

struct RawMemoryRow {
    key: String,
    value: String,
    metadata: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

fn parse_memory_row(row: &Row<'_>) -> rusqlite::Result<RawMemoryRow> {
    Ok(RawMemoryRow {
        key: row.get("key")?,
        value: row.get("value")?,
        metadata: row.get("metadata")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

// Tables adopted from older deployments may carry NULL timestamps.
fn check_record(raw: RawMemoryRow) -> RepoResult<MemoryRecord> {
    let created_at = raw.created_at.ok_or_else(|| {
        RepoError::InvalidData(format!("memories.created_at is NULL for key `{}`", raw.key))
    })?;
    let updated_at = raw.updated_at.ok_or_else(|| {
        RepoError::InvalidData(format!("memories.updated_at is NULL for key `{}`", raw.key))
    })?;

    Ok(MemoryRecord {
        key: raw.key,
        value: raw.value,
        metadata: raw.metadata,
        created_at,
        updated_at,
    })
}
