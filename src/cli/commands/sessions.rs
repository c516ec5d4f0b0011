//! Session listing and cleanup.

use std::time::Duration;

use chrono::Utc;

use crate::cli::SessionsArgs;
use crate::config::Config;
use crate::error::Result;

use super::{emit, session_manager};

/// List persisted sessions, newest first.
pub fn list(config: &Config, args: &SessionsArgs) -> Result<()> {
    let manager = session_manager(config)?;
    let sessions = manager.list_sessions();

    if args.json {
        return emit(&serde_json::to_string_pretty(&sessions)?);
    }
    if sessions.is_empty() {
        return emit("No sessions.");
    }

    let now = Utc::now();
    let lines: Vec<String> = sessions
        .iter()
        .map(|s| {
            let age = (now - s.created_at)
                .to_std()
                .map_or(Duration::ZERO, |d| Duration::from_secs(d.as_secs()));
            format!(
                "{} {}  {} entries  {} ago  {}",
                if s.active { "*" } else { " " },
                s.id,
                s.entries,
                humantime::format_duration(age),
                s.source_file.display()
            )
        })
        .collect();
    emit(&lines.join("\n"))
}

/// Remove expired descriptors.
pub fn clean(config: &Config) -> Result<()> {
    let manager = session_manager(config)?;
    let removed = manager.clean_expired_sessions();
    emit(&format!("Removed {removed} expired session(s)."))
}
