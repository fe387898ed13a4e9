//! Operation handlers for the four memory tools.
//!
//! # Responsibility
//! - Validate caller arguments, delegate to `MemoryService`, and map the
//!   outcome to a `ToolOutcome`.
//!
//! # Invariants
//! - Each handler issues at most one storage call.
//! - No error escapes a handler; every fault becomes `ToolOutcome::Failure`.
//! - Metadata is returned as structured JSON, or `null` when none is stored.

use crate::envelope::{ToolFailure, ToolOutcome};
use memory_core::{MemoryRecord, MemoryRepository, MemoryService, NewMemory, RepoError};
use rmcp::schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Number, Value};

pub const STORE_SUCCESS_MESSAGE: &str = "Memory stored successfully";
pub const DELETE_SUCCESS_MESSAGE: &str = "Memory deleted successfully";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct StoreMemoryArgs {
    /// Unique identifier for the memory
    pub key: String,
    /// The memory content to store
    pub value: String,
    /// Optional JSON metadata as a string
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct KeyArgs {
    /// Unique identifier of the memory
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ListMemoriesArgs {
    /// Maximum number of memories to return
    #[serde(default, deserialize_with = "deserialize_positive_limit")]
    #[schemars(range(min = 1))]
    pub limit: Option<u64>,
}

// Accepts any positive JSON integer, including integral floats like `2.0`.
fn deserialize_positive_limit<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    positive_integer(&number)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("limit must be a positive integer, got {number}")))
}

fn positive_integer(number: &Number) -> Option<u64> {
    if let Some(value) = number.as_u64() {
        return (value > 0).then_some(value);
    }
    let value = number.as_f64()?;
    // `as` saturates at u64::MAX for integral floats beyond its range.
    (value >= 1.0 && value.fract() == 0.0).then_some(value as u64)
}

/// Handler set bound to one memory service.
pub struct MemoryTools<R: MemoryRepository> {
    service: MemoryService<R>,
}

impl<R: MemoryRepository> MemoryTools<R> {
    pub fn new(service: MemoryService<R>) -> Self {
        Self { service }
    }

    /// `store_memory`: upserts `key` with `value` and optional JSON metadata.
    pub fn store_memory(&self, args: StoreMemoryArgs) -> ToolOutcome {
        let mut memory = NewMemory::new(args.key, args.value);
        memory.metadata = args.metadata;

        match self.service.store(&memory) {
            Ok(record) => ToolOutcome::Success(json!({
                "message": STORE_SUCCESS_MESSAGE,
                "key": record.key,
            })),
            Err(err) => ToolOutcome::Failure(classify("Error storing memory", err)),
        }
    }

    /// `retrieve_memory`: returns the full record for `key`.
    pub fn retrieve_memory(&self, args: KeyArgs) -> ToolOutcome {
        match self.service.retrieve(&args.key) {
            Ok(Some(record)) => match record_payload(record) {
                Ok(payload) => ToolOutcome::Success(payload),
                Err(message) => ToolOutcome::Failure(ToolFailure::Storage(format!(
                    "Error retrieving memory: {message}"
                ))),
            },
            Ok(None) => ToolOutcome::Failure(ToolFailure::NotFound { key: args.key }),
            Err(err) => ToolOutcome::Failure(classify("Error retrieving memory", err)),
        }
    }

    /// `list_memories`: most recently updated first, optionally bounded.
    pub fn list_memories(&self, args: ListMemoriesArgs) -> ToolOutcome {
        let records = match self.service.list_recent(args.limit) {
            Ok(records) => records,
            Err(err) => return ToolOutcome::Failure(classify("Error listing memories", err)),
        };

        let memories = match records
            .into_iter()
            .map(record_payload)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(memories) => memories,
            Err(message) => {
                return ToolOutcome::Failure(ToolFailure::Storage(format!(
                    "Error listing memories: {message}"
                )));
            }
        };

        ToolOutcome::Success(json!({
            "count": memories.len(),
            "memories": memories,
        }))
    }

    /// `delete_memory`: removes `key`; a missing key is a not-found failure.
    pub fn delete_memory(&self, args: KeyArgs) -> ToolOutcome {
        match self.service.delete(&args.key) {
            Ok(0) => ToolOutcome::Failure(ToolFailure::NotFound { key: args.key }),
            Ok(_) => ToolOutcome::Success(json!({
                "message": DELETE_SUCCESS_MESSAGE,
                "key": args.key,
            })),
            Err(err) => ToolOutcome::Failure(classify("Error deleting memory", err)),
        }
    }
}

fn classify(context: &str, err: RepoError) -> ToolFailure {
    let message = format!("{context}: {err}");
    match err {
        RepoError::Validation(_) | RepoError::InvalidQuery(_) => ToolFailure::Validation(message),
        RepoError::Db(_) | RepoError::InvalidData(_) => ToolFailure::Storage(message),
    }
}

fn record_payload(record: MemoryRecord) -> Result<Value, String> {
    let metadata = record.metadata_json().map_err(|err| {
        format!(
            "stored metadata for `{}` is not valid JSON: {err}",
            record.key
        )
    })?;

    Ok(json!({
        "key": record.key,
        "value": record.value,
        "metadata": metadata,
        "created_at": record.created_at,
        "updated_at": record.updated_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::ListMemoriesArgs;
    use serde_json::json;

    fn parse(arguments: serde_json::Value) -> Result<ListMemoriesArgs, serde_json::Error> {
        serde_json::from_value(arguments)
    }

    #[test]
    fn limit_accepts_positive_integers_in_any_json_form() {
        assert_eq!(parse(json!({})).unwrap().limit, None);
        assert_eq!(parse(json!({"limit": null})).unwrap().limit, None);
        assert_eq!(parse(json!({"limit": 2})).unwrap().limit, Some(2));
        assert_eq!(parse(json!({"limit": 2.0})).unwrap().limit, Some(2));
        assert_eq!(
            parse(json!({"limit": 5_000_000_000u64})).unwrap().limit,
            Some(5_000_000_000)
        );
        assert_eq!(parse(json!({"limit": 1e30})).unwrap().limit, Some(u64::MAX));
    }

    #[test]
    fn limit_rejects_non_positive_and_fractional_values() {
        for limit in [json!(0), json!(-3), json!(0.0), json!(2.5), json!("2")] {
            assert!(parse(json!({ "limit": limit })).is_err(), "limit {limit}");
        }
    }
}
