//! Heuristic analyses over a loaded capture.
//!
//! - [`find_errors`]: failed requests with a snippet of their response body
//! - [`find_security_issues`]: bearer JWTs and secret-looking query parameters
//! - [`find_slow`]: requests at or above a time threshold
//!
//! Security analysis is best-effort pattern matching over headers and query
//! strings. Bodies are not scanned, and secrets are only ever shown masked.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::{HarError, Result};
use crate::format::{collapse_whitespace, entry_line, format_duration, truncate_end};
use crate::model::{entry::query_of, Har, IndexedEntry};
use crate::refs::{ContentSection, Rendered};
use crate::util::{bearer_jwt, is_secret_param_name, mask_secret, parse_query};

/// Available analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisType {
    /// Failed requests.
    Errors,
    /// Exposed credentials.
    Security,
    /// Slow requests.
    Slow,
}

impl FromStr for AnalysisType {
    type Err = HarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "errors" | "error" => Ok(Self::Errors),
            "security" => Ok(Self::Security),
            "slow" | "performance" => Ok(Self::Slow),
            _ => Err(HarError::UnknownAnalysis {
                value: s.to_string(),
            }),
        }
    }
}

/// A failed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorFinding {
    /// The failing entry.
    pub entry: IndexedEntry,
    /// Start of the response body, whitespace collapsed.
    pub snippet: Option<String>,
}

/// What a security finding is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecurityIssue {
    /// An Authorization-style header carries a bearer JWT.
    BearerJwt {
        /// Header name as captured.
        header: String,
    },
    /// A query parameter name follows secret/key conventions.
    SecretQueryParam {
        /// Parameter name as captured.
        name: String,
    },
}

/// One security finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityFinding {
    /// The entry the finding was made in.
    pub entry: IndexedEntry,
    /// The issue.
    pub issue: SecurityIssue,
    /// Masked value.
    pub masked: String,
}

impl SecurityFinding {
    /// One-line description without the entry prefix.
    pub fn describe(&self) -> String {
        match &self.issue {
            SecurityIssue::BearerJwt { header } => {
                format!("Bearer JWT in {header} header: {}", self.masked)
            }
            SecurityIssue::SecretQueryParam { name } => {
                format!("Secret-like query parameter '{name}': {}", self.masked)
            }
        }
    }
}

/// Error entries, each with a short response body snippet.
pub fn find_errors(
    entries: &[IndexedEntry],
    har: &Har,
    snippet_length: usize,
) -> Vec<ErrorFinding> {
    entries
        .iter()
        .filter(|e| e.is_error)
        .map(|e| {
            let snippet = har
                .entry(e.index)
                .and_then(|raw| ContentSection::ResponseBody.render(raw))
                .map(Rendered::into_text)
                .map(|text| truncate_end(&collapse_whitespace(&text), snippet_length))
                .filter(|s| !s.is_empty());
            ErrorFinding {
                entry: e.clone(),
                snippet,
            }
        })
        .collect()
}

/// Bearer JWTs in Authorization headers and secret-named query parameters.
pub fn find_security_issues(entries: &[IndexedEntry], har: &Har) -> Vec<SecurityFinding> {
    let mut findings = Vec::new();

    for indexed in entries {
        let Some(raw) = har.entry(indexed.index) else {
            continue;
        };

        for header in &raw.request.headers {
            let is_auth = header.name.eq_ignore_ascii_case("authorization")
                || header.name.eq_ignore_ascii_case("proxy-authorization");
            if !is_auth {
                continue;
            }
            if let Some(token) = bearer_jwt(&header.value) {
                findings.push(SecurityFinding {
                    entry: indexed.clone(),
                    issue: SecurityIssue::BearerJwt {
                        header: header.name.clone(),
                    },
                    masked: mask_secret(token),
                });
            }
        }

        let params: Vec<(String, String)> = if raw.request.query_string.is_empty() {
            query_of(&raw.request.url).map(parse_query).unwrap_or_default()
        } else {
            raw.request
                .query_string
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect()
        };

        let mut seen = HashSet::new();
        for (name, value) in params {
            if value.is_empty() || !is_secret_param_name(&name) || !seen.insert(name.clone()) {
                continue;
            }
            findings.push(SecurityFinding {
                entry: indexed.clone(),
                issue: SecurityIssue::SecretQueryParam { name },
                masked: mask_secret(&value),
            });
        }
    }

    debug!(findings = findings.len(), "Security scan finished");
    findings
}

/// Entries at or above `threshold_ms`, slowest first.
pub fn find_slow(entries: &[IndexedEntry], threshold_ms: f64) -> Vec<&IndexedEntry> {
    let mut slow: Vec<&IndexedEntry> = entries
        .iter()
        .filter(|e| e.time_ms >= threshold_ms)
        .collect();
    slow.sort_by(|a, b| b.time_ms.total_cmp(&a.time_ms));
    slow
}

/// Render error findings, or `No errors found.`
///
/// At most `limit` findings are listed; the header keeps the full count.
pub fn render_errors(findings: &[ErrorFinding], path_width: usize, limit: usize) -> String {
    if findings.is_empty() {
        return "No errors found.".to_string();
    }
    let mut out = format!("Found {} error(s):", findings.len());
    for finding in findings.iter().take(limit) {
        let _ = write!(out, "\n{}", entry_line(&finding.entry, path_width));
        if let Some(snippet) = &finding.snippet {
            let _ = write!(out, " -> {snippet}");
        }
    }
    push_truncation(&mut out, limit, findings.len(), "errors");
    out
}

/// Render security findings, or `No security findings.`
pub fn render_security(findings: &[SecurityFinding], path_width: usize, limit: usize) -> String {
    if findings.is_empty() {
        return "No security findings.".to_string();
    }
    let mut out = format!("Found {} security finding(s):", findings.len());
    for finding in findings.iter().take(limit) {
        let _ = write!(
            out,
            "\n{} -> {}",
            entry_line(&finding.entry, path_width),
            finding.describe()
        );
    }
    push_truncation(&mut out, limit, findings.len(), "findings");
    out
}

/// Render slow entries, or `No slow requests found.`
pub fn render_slow(
    slow: &[&IndexedEntry],
    threshold_ms: f64,
    path_width: usize,
    limit: usize,
) -> String {
    if slow.is_empty() {
        return "No slow requests found.".to_string();
    }
    let mut out = format!(
        "Found {} slow request(s) (>= {}):",
        slow.len(),
        format_duration(threshold_ms)
    );
    for entry in slow.iter().take(limit) {
        let _ = write!(
            out,
            "\n{} -> {}",
            entry_line(entry, path_width),
            format_duration(entry.time_ms)
        );
    }
    push_truncation(&mut out, limit, slow.len(), "slow requests");
    out
}

fn push_truncation(out: &mut String, limit: usize, total: usize, noun: &str) {
    if total > limit {
        let _ = write!(out, "\n... showing {limit} of {total} {noun}");
    }
}
