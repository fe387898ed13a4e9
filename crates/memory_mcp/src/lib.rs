//! Tool surface of the memory server.
//!
//! # Responsibility
//! - Expose `store_memory`, `retrieve_memory`, `list_memories` and
//!   `delete_memory` as MCP tools.
//!
//! # Invariants
//! - Per-call faults never escape as panics or protocol errors; they are
//!   answered in-band.

pub mod envelope;
pub mod handlers;
pub mod server;

pub use envelope::{ToolFailure, ToolOutcome};
pub use handlers::{KeyArgs, ListMemoriesArgs, MemoryTools, StoreMemoryArgs};
pub use server::{MemoryServer, SERVER_NAME};
