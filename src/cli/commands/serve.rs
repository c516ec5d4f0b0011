//! Serve command implementation.

use crate::error::{HarError, Result};
use crate::mcp_server::run_server;
use crate::protocol::Inspector;

/// Serve MCP tools over stdio until the client disconnects.
pub fn run(inspector: Inspector) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| HarError::io("Failed to start async runtime", e))?;
    runtime.block_on(run_server(inspector))
}
