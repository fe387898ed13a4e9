//! Memory use-case service.
//!
//! # Responsibility
//! - Provide store / retrieve / list / delete entry points.
//! - Emit one metadata-only log event per call.
//!
//! # Invariants
//! - Each call maps to exactly one repository primitive.
//! - The service holds no cached records between calls.
//! - Values and metadata bodies are never logged.

use crate::logging::sanitize_message;
use crate::model::memory::{MemoryRecord, NewMemory};
use crate::repo::memory_repo::{MemoryListQuery, MemoryRepository, RepoResult};
use log::{info, warn};
use std::time::Instant;

const MAX_LOGGED_KEY_CHARS: usize = 64;

/// Use-case wrapper around a [`MemoryRepository`].
pub struct MemoryService<R: MemoryRepository> {
    repo: R,
}

impl<R: MemoryRepository> MemoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores `memory`, replacing value and metadata if the key exists.
    ///
    /// Validation runs before any SQL is issued; a rejected input leaves
    /// storage untouched.
    pub fn store(&self, memory: &NewMemory) -> RepoResult<MemoryRecord> {
        let started_at = Instant::now();
        let result = self.repo.upsert_memory(memory);
        log_outcome("memory_store", &memory.key, started_at, &result);
        result
    }

    /// Loads one memory by key. Absence is `Ok(None)`, not an error.
    pub fn retrieve(&self, key: &str) -> RepoResult<Option<MemoryRecord>> {
        let started_at = Instant::now();
        let result = self.repo.get_memory(key);
        if let Ok(None) = &result {
            info!(
                "event=memory_retrieve module=service status=not_found key={} duration_ms={}",
                sanitize_message(key, MAX_LOGGED_KEY_CHARS),
                started_at.elapsed().as_millis()
            );
            return result;
        }
        log_outcome("memory_retrieve", key, started_at, &result);
        result
    }

    /// Lists memories, most recently updated first.
    pub fn list_recent(&self, limit: Option<u64>) -> RepoResult<Vec<MemoryRecord>> {
        let started_at = Instant::now();
        let query = limit.map_or_else(MemoryListQuery::default, MemoryListQuery::with_limit);
        let result = self.repo.list_memories(&query);
        match &result {
            Ok(records) => info!(
                "event=memory_list module=service status=ok limit={} count={} duration_ms={}",
                limit.map_or_else(|| "none".to_string(), |value| value.to_string()),
                records.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=memory_list module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Deletes one memory; returns the number of removed records (0 or 1).
    pub fn delete(&self, key: &str) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.repo.delete_memory(key);
        if let Ok(0) = &result {
            info!(
                "event=memory_delete module=service status=not_found key={} duration_ms={}",
                sanitize_message(key, MAX_LOGGED_KEY_CHARS),
                started_at.elapsed().as_millis()
            );
            return result;
        }
        log_outcome("memory_delete", key, started_at, &result);
        result
    }
}

fn log_outcome<T>(event: &str, key: &str, started_at: Instant, result: &RepoResult<T>) {
    let key = sanitize_message(key, MAX_LOGGED_KEY_CHARS);
    match result {
        Ok(_) => info!(
            "event={event} module=service status=ok key={key} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module=service status=error key={key} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
}
