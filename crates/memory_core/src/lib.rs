//! Persistence core for the memory server.
//! Owns the `memories` table and every invariant on memory records.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ServerConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::memory::{MemoryKey, MemoryRecord, MemoryValidationError, NewMemory};
pub use repo::memory_repo::{
    MemoryListQuery, MemoryRepository, RepoError, RepoResult, SqliteMemoryRepository,
};
pub use service::memory_service::MemoryService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
