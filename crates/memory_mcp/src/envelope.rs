//! Uniform response envelope for tool calls.
//!
//! # Responsibility
//! - Model handler results as a tagged success/failure value.
//! - Render outcomes into the MCP tool result returned to callers.
//!
//! # Invariants
//! - Every failure renders as `{"success": false, "message": ...}`.
//! - The tool result is flagged as an error on every failure and never on
//!   success.

use rmcp::model::{CallToolResult, Content};
use serde_json::{json, Map, Value};
use std::fmt::{Display, Formatter};

/// Why a tool call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFailure {
    /// Input rejected before storage was touched.
    Validation(String),
    /// Defined negative outcome for retrieve/delete.
    NotFound { key: String },
    /// Storage engine fault or unreadable persisted data.
    Storage(String),
}

impl ToolFailure {
    pub fn message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Storage(message) => message.clone(),
            Self::NotFound { key } => format!("Memory not found: {key}"),
        }
    }
}

impl Display for ToolFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Result of one handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Success payload; `success: true` is added on render.
    Success(Value),
    Failure(ToolFailure),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Envelope body as structured JSON.
    pub fn to_envelope(&self) -> Value {
        match self {
            Self::Success(payload) => {
                let mut body = Map::new();
                body.insert("success".to_string(), Value::Bool(true));
                if let Value::Object(fields) = payload {
                    body.extend(fields.clone());
                }
                Value::Object(body)
            }
            Self::Failure(failure) => json!({
                "success": false,
                "message": failure.message(),
            }),
        }
    }

    /// Renders the envelope as the single text block of a tool result.
    pub fn into_call_result(self) -> CallToolResult {
        let content = vec![Content::text(self.to_envelope().to_string())];
        if self.is_success() {
            CallToolResult::success(content)
        } else {
            CallToolResult::error(content)
        }
    }
}
