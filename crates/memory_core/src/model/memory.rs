//! Memory record model and write-side validation.
//!
//! # Responsibility
//! - Define `MemoryRecord` (persisted form) and `NewMemory` (write input).
//! - Validate keys and JSON metadata before they reach SQLite.
//!
//! # Invariants
//! - `metadata` is stored as raw JSON text and never interpreted by storage.
//! - `created_at` is set once; `updated_at >= created_at` always.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Primary key of a memory record.
pub type MemoryKey = String;

/// Validation failures detected before touching storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryValidationError {
    /// Key is the empty string. Whitespace-only keys are valid.
    EmptyKey,
    /// Metadata was supplied but does not parse as JSON.
    InvalidMetadata(String),
}

impl Display for MemoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "memory key cannot be empty"),
            Self::InvalidMetadata(reason) => write!(f, "metadata is not valid JSON: {reason}"),
        }
    }
}

impl Error for MemoryValidationError {}

/// Write input for the upsert primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemory {
    pub key: MemoryKey,
    pub value: String,
    /// Raw JSON text. `None` and `Some("")` both persist as SQL `NULL`.
    pub metadata: Option<String>,
}

impl NewMemory {
    pub fn new(key: impl Into<MemoryKey>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Checks key and metadata without touching storage.
    pub fn validate(&self) -> Result<(), MemoryValidationError> {
        if self.key.is_empty() {
            return Err(MemoryValidationError::EmptyKey);
        }
        if let Some(metadata) = self.stored_metadata() {
            serde_json::from_str::<Value>(metadata)
                .map_err(|err| MemoryValidationError::InvalidMetadata(err.to_string()))?;
        }
        Ok(())
    }

    /// Metadata text as it will be persisted.
    pub fn stored_metadata(&self) -> Option<&str> {
        self.metadata.as_deref().filter(|text| !text.is_empty())
    }
}

/// One row of the `memories` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub key: MemoryKey,
    pub value: String,
    /// Raw JSON text as stored.
    pub metadata: Option<String>,
    /// UTC, `YYYY-MM-DD HH:MM:SS.SSS`. Set on first insert only.
    pub created_at: String,
    /// UTC, `YYYY-MM-DD HH:MM:SS.SSS`. Refreshed on every upsert.
    pub updated_at: String,
}

impl MemoryRecord {
    /// Decodes stored metadata into structured JSON.
    ///
    /// Returns `Value::Null` when no metadata was stored.
    pub fn metadata_json(&self) -> Result<Value, serde_json::Error> {
        match self.metadata.as_deref() {
            Some(text) if !text.is_empty() => serde_json::from_str(text),
            _ => Ok(Value::Null),
        }
    }
}
