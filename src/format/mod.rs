//! Text rendering for capture summaries and entries.
//!
//! Everything here is a pure function of its arguments: no I/O, no state.

use std::fmt::Write as _;

use crate::model::IndexedEntry;
use crate::session::Session;

/// Number of domains shown on the dashboard.
const DASHBOARD_TOP_DOMAINS: usize = 8;

/// Render the dashboard shown after `load` and by `overview`.
pub fn dashboard(session: &Session) -> String {
    let stats = &session.stats;
    let mut out = String::new();

    let name = session.source_file.file_name().map_or_else(
        || session.source_file.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    );

    let _ = writeln!(out, "Capture: {name}");
    let _ = writeln!(out, "Source: {}", session.source_file.display());
    let _ = writeln!(
        out,
        "Entries: {} | Errors: {} | Size: {} | Time: {}",
        stats.total_entries,
        stats.error_count,
        format_bytes(stats.total_size),
        format_duration(stats.total_time_ms)
    );

    if !stats.status_buckets.is_empty() {
        let buckets: Vec<String> = stats
            .status_buckets
            .iter()
            .map(|(bucket, count)| format!("{bucket} {count}"))
            .collect();
        let _ = writeln!(out, "Status: {}", buckets.join(", "));
    }

    if !stats.methods.is_empty() {
        let methods: Vec<String> = stats
            .methods
            .iter()
            .map(|(method, count)| format!("{method} {count}"))
            .collect();
        let _ = writeln!(out, "Methods: {}", methods.join(", "));
    }

    if !stats.domains.is_empty() {
        let _ = writeln!(out, "Domains ({}):", stats.domains.len());
        let width = stats
            .domains
            .keys()
            .take(DASHBOARD_TOP_DOMAINS)
            .map(|d| display_domain(d).len())
            .max()
            .unwrap_or(0);
        for (domain, count) in stats.domains.iter().take(DASHBOARD_TOP_DOMAINS) {
            let _ = writeln!(out, "  {:<width$}  {count}", display_domain(domain));
        }
        if stats.domains.len() > DASHBOARD_TOP_DOMAINS {
            let _ = writeln!(
                out,
                "  ... and {} more",
                stats.domains.len() - DASHBOARD_TOP_DOMAINS
            );
        }
    }

    let _ = writeln!(
        out,
        "Session: {} (loaded {})",
        session.id(),
        session.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out.push_str("Next: list, detail <e#>, search <text>, analyze errors|security");
    out
}

fn display_domain(domain: &str) -> &str {
    if domain.is_empty() {
        "(no host)"
    } else {
        domain
    }
}

/// Render one entry as `[e<idx>] METHOD path status`.
pub fn entry_line(entry: &IndexedEntry, path_width: usize) -> String {
    format!(
        "[{}] {} {} {}",
        entry.label(),
        entry.method,
        truncate_middle(&entry.path, path_width),
        status_label(entry.status)
    )
}

/// Status column text; `ERR` for network-level failures.
pub fn status_label(status: u16) -> String {
    if status == 0 {
        "ERR".to_string()
    } else {
        status.to_string()
    }
}

/// Shorten `text` to at most `max` characters by eliding its middle.
pub fn truncate_middle(text: &str, max: usize) -> String {
    const ELLIPSIS: &str = "...";

    let len = text.chars().count();
    if len <= max {
        return text.to_string();
    }
    if max <= ELLIPSIS.len() {
        return text.chars().take(max).collect();
    }

    let keep = max - ELLIPSIS.len();
    let head = keep.div_ceil(2);
    let tail = keep - head;

    let mut out: String = text.chars().take(head).collect();
    out.push_str(ELLIPSIS);
    out.extend(text.chars().skip(len - tail));
    out
}

/// Shorten `text` to at most `max` characters, keeping the start.
pub fn truncate_end(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Format bytes in a human-readable format.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Format a millisecond duration at a human scale.
pub fn format_duration(ms: f64) -> String {
    if !ms.is_finite() || ms <= 0.0 {
        return "0ms".to_string();
    }
    if ms < 1000.0 {
        format!("{}ms", ms.round() as u64)
    } else if ms < 60_000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        let total_secs = (ms / 1000.0).round() as u64;
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m {seconds}s")
        }
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
