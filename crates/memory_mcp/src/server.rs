//! MCP server binding for the memory tools.
//!
//! # Responsibility
//! - Register `store_memory`, `retrieve_memory`, `list_memories` and
//!   `delete_memory` with the rmcp tool router.
//! - Own the process-wide connection and hand it to one handler at a time.
//!
//! # Invariants
//! - Every tool call holds the connection lock for exactly one storage call;
//!   calls never overlap on the connection.
//! - Tool faults are answered in-band as error results, never as protocol
//!   errors.

use crate::envelope::ToolOutcome;
use crate::handlers::{KeyArgs, ListMemoriesArgs, MemoryTools, StoreMemoryArgs};
use log::info;
use memory_core::logging::sanitize_message;
use memory_core::{MemoryService, SqliteMemoryRepository};
use parking_lot::Mutex;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use rusqlite::Connection;
use std::sync::Arc;

pub const SERVER_NAME: &str = "memory-server";

const MAX_LOGGED_NAME_CHARS: usize = 64;

/// MCP server exposing the memory tools over one SQLite connection.
#[derive(Clone)]
pub struct MemoryServer {
    conn: Arc<Mutex<Connection>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MemoryServer {
    /// Takes ownership of an opened, migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Store a key-value pair with optional metadata in the memory database")]
    pub async fn store_memory(
        &self,
        Parameters(args): Parameters<StoreMemoryArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call("store_memory", |tools| tools.store_memory(args)))
    }

    #[tool(description = "Retrieve a memory by its key")]
    pub async fn retrieve_memory(
        &self,
        Parameters(args): Parameters<KeyArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call("retrieve_memory", |tools| tools.retrieve_memory(args)))
    }

    #[tool(description = "List all memories in the database, optionally limited")]
    pub async fn list_memories(
        &self,
        Parameters(args): Parameters<ListMemoriesArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call("list_memories", |tools| tools.list_memories(args)))
    }

    #[tool(description = "Delete a memory by its key")]
    pub async fn delete_memory(
        &self,
        Parameters(args): Parameters<KeyArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call("delete_memory", |tools| tools.delete_memory(args)))
    }

    // The guard is released before returning, so it never crosses an await.
    fn call(
        &self,
        tool: &str,
        handler: impl FnOnce(&MemoryTools<SqliteMemoryRepository<'_>>) -> ToolOutcome,
    ) -> CallToolResult {
        let conn = self.conn.lock();
        let tools = MemoryTools::new(MemoryService::new(SqliteMemoryRepository::new(&conn)));
        let outcome = handler(&tools);

        info!(
            "event=tool_call module=server tool={} status={}",
            sanitize_message(tool, MAX_LOGGED_NAME_CHARS),
            if outcome.is_success() { "ok" } else { "failed" }
        );
        outcome.into_call_result()
    }
}

#[tool_handler]
impl ServerHandler for MemoryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(
                "Persistent key/value memory. Store, retrieve, list and delete memories by key; \
                 metadata is optional JSON text."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}
