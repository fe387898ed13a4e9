//! `memory-server` entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging, and open the database once.
//! - Serve the memory tools over MCP stdio until the client disconnects.
//!
//! # Invariants
//! - Nothing but protocol messages is written to stdout.
//! - Startup failures exit with status 1 after one stderr line.

use log::{error, info};
use memory_core::db::open_db;
use memory_core::{init_logging, ServerConfig};
use memory_mcp::MemoryServer;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=server_exit module=cli status=error error={message}");
            eprintln!("memory-server: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let config = ServerConfig::from_env().map_err(|err| err.to_string())?;
    init_logging(config.log_level, config.log_target())?;

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    info!(
        "event=server_start module=cli status=ok db_path={} version={}",
        config.db_path.display(),
        memory_core::core_version()
    );

    let service = MemoryServer::new(conn)
        .serve(stdio())
        .await
        .map_err(|err| format!("MCP initialization failed: {err}"))?;
    let reason = service
        .waiting()
        .await
        .map_err(|err| format!("MCP service task failed: {err}"))?;

    info!("event=server_stop module=cli status=ok reason={reason:?}");
    Ok(())
}
