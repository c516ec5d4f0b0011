//! CLI command implementations.
//!
//! Inspection commands delegate to [`Inspector`](crate::protocol::Inspector);
//! the rest manage sessions and configuration directly.

pub mod config;
pub mod export;
pub mod inspect;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod sessions;

use std::io::{self, Write};

use crate::config::Config;
use crate::error::{HarError, Result};
use crate::session::SessionManager;

/// Print a result to stdout, ending with a newline.
///
/// A closed pipe (`harscope list | head`) is not an error.
pub fn emit(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match writeln!(handle, "{text}").and_then(|()| handle.flush()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(HarError::io("Failed to write to stdout", e)),
    }
}

/// Session manager for the configured sessions directory.
pub fn session_manager(config: &Config) -> Result<SessionManager> {
    SessionManager::from_config(&config.sessions)
}
