//! Utility functions for common operations.
//!
//! This module provides shared utilities used across the crate:
//! - Atomic file operations for descriptor and export integrity
//! - Content hashing for staleness detection
//! - Sensitive data patterns shared by analysis and sanitizing exports

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{HarError, Result};

/// Placeholder substituted for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Atomically write content to a file.
///
/// Writes to a temporary file in the same directory, flushes it, then
/// renames it over the target. A concurrent reader sees either the old file
/// or the new one, never a partial write.
///
/// # Example
///
/// ```rust,no_run
/// use harscope::util::atomic_write;
///
/// atomic_write("session.json", b"{}").unwrap();
/// ```
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(HarError::Io {
                context: format!("Cannot determine parent directory for: {}", path.display()),
                source: io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
            })
        }
    };

    if !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|e| {
            HarError::io(format!("Failed to create directory: {}", parent.display()), e)
        })?;
    }

    // Same directory keeps the rename on one filesystem
    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| {
        HarError::io(
            format!("Failed to create temporary file in: {}", parent.display()),
            e,
        )
    })?;

    temp_file.write_all(content).map_err(|e| {
        HarError::io(
            format!("Failed to write to temporary file for: {}", path.display()),
            e,
        )
    })?;

    temp_file.flush().map_err(|e| {
        HarError::io(
            format!("Failed to flush temporary file for: {}", path.display()),
            e,
        )
    })?;

    temp_file.persist(path).map_err(|e| {
        HarError::io(
            format!("Failed to atomically write file: {}", path.display()),
            e.error,
        )
    })?;

    Ok(())
}

/// Hex-encoded SHA-256 of a byte slice.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Sensitive Data Patterns
// ============================================================================

/// Compiled patterns, built once.
static PATTERNS: Lazy<SensitivePatterns> = Lazy::new(SensitivePatterns::new);

struct SensitivePatterns {
    bearer_jwt: Regex,
    secret_param: Regex,
    api_key: Regex,
    bearer_token: Regex,
    password_env: Regex,
    url_credentials: Regex,
    aws_access_key: Regex,
    github_token: Regex,
    generic_secret: Regex,
}

impl SensitivePatterns {
    fn new() -> Self {
        Self {
            // Bearer followed by a three-part base64url token starting with a JSON header
            bearer_jwt: Regex::new(
                r"(?i)^\s*bearer\s+(eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*)\s*$"
            ).unwrap(),

            // Query parameter names that conventionally carry credentials
            secret_param: Regex::new(
                r"(?i)(^|[_.-])(api[_-]?key|apikey|access[_-]?key|private[_-]?key|secret|client[_-]?secret|token|access[_-]?token|refresh[_-]?token|id[_-]?token|auth|password|passwd|pwd|sig|signature|session[_-]?id|sessionid|key)($|[_.-])"
            ).unwrap(),

            api_key: Regex::new(
                r#"(?i)(api[_-]?key|apikey|secret[_-]?key|private[_-]?key|access[_-]?key)(["']?\s*[=:]\s*["']?)([a-zA-Z0-9_-]{16,})"#
            ).unwrap(),

            bearer_token: Regex::new(
                r"(?i)Bearer\s+[a-zA-Z0-9_.~+/=-]+"
            ).unwrap(),

            password_env: Regex::new(
                r#"(?i)(password|passwd|pwd)(["']?\s*[=:]\s*["']?)([^\s'"&,}]{3,})"#
            ).unwrap(),

            url_credentials: Regex::new(
                r"(?i)((?:https?|ftp|wss?)://)[^:/@\s]+:[^@\s]+@"
            ).unwrap(),

            aws_access_key: Regex::new(
                r"\b(?:A3T[A-Z0-9]|AKIA|ABIA|ACCA|ASIA)[A-Z0-9]{16}\b"
            ).unwrap(),

            github_token: Regex::new(
                r"\b(gh[pousr]_[a-zA-Z0-9]{36,})\b"
            ).unwrap(),

            generic_secret: Regex::new(
                r#"(?i)(token|secret|credential)(["']?\s*[=:]\s*["']?)([a-zA-Z0-9_.-]{20,})"#
            ).unwrap(),
        }
    }
}

/// Header names whose values are credentials or session state.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
    "x-csrf-token",
    "x-xsrf-token",
    "x-amz-security-token",
];

/// Whether a header's value should be treated as a secret.
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Whether a query parameter name follows secret/key naming conventions.
pub fn is_secret_param_name(name: &str) -> bool {
    PATTERNS.secret_param.is_match(name)
}

/// Extract the token from an `Authorization: Bearer <jwt>` value.
pub fn bearer_jwt(value: &str) -> Option<&str> {
    PATTERNS
        .bearer_jwt
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Show only the first few characters of a secret.
pub fn mask_secret(value: &str) -> String {
    const VISIBLE: usize = 6;
    if value.chars().count() <= VISIBLE {
        return "*".repeat(value.chars().count().max(3));
    }
    let visible: String = value.chars().take(VISIBLE).collect();
    format!("{visible}...")
}

/// Redact credentials embedded in free text (bodies, URLs).
///
/// Heuristic: catches common key/token/password shapes, not every secret.
///
/// ```rust
/// use harscope::util::redact_text;
///
/// let redacted = redact_text(r#"{"api_key": "abcdef0123456789abcdef"}"#);
/// assert!(!redacted.contains("abcdef0123456789abcdef"));
/// ```
pub fn redact_text(text: &str) -> Cow<'_, str> {
    let mut result = text.to_string();

    result = PATTERNS.aws_access_key.replace_all(&result, REDACTED).into_owned();
    result = PATTERNS.github_token.replace_all(&result, REDACTED).into_owned();
    result = PATTERNS
        .url_credentials
        .replace_all(&result, |caps: &regex::Captures| format!("{}{REDACTED}@", &caps[1]))
        .into_owned();
    result = PATTERNS
        .bearer_token
        .replace_all(&result, format!("Bearer {REDACTED}").as_str())
        .into_owned();
    for pattern in [&PATTERNS.api_key, &PATTERNS.password_env, &PATTERNS.generic_secret] {
        result = pattern
            .replace_all(&result, |caps: &regex::Captures| {
                format!("{}{}{REDACTED}", &caps[1], &caps[2])
            })
            .into_owned();
    }

    if result == text {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(result)
    }
}

/// Replace the values of secret-named parameters in a URL's query string.
pub fn redact_url_query(url: &str) -> String {
    let Some((base, rest)) = url.split_once('?') else {
        return url.to_string();
    };
    let (query, fragment) = match rest.split_once('#') {
        Some((q, f)) => (q, Some(f)),
        None => (rest, None),
    };

    let redacted: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if is_secret_param_name(&decode_component(name)) => {
                format!("{name}={REDACTED}")
            }
            _ => pair.to_string(),
        })
        .collect();

    let mut out = format!("{base}?{}", redacted.join("&"));
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    redact_text(&out).into_owned()
}

/// Percent-decode one query string component (`+` is a space).
pub fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_encoding::percent_decode_str(&spaced)
        .decode_utf8_lossy()
        .into_owned()
}

/// Split a raw query string into decoded name/value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(name), decode_component(value))
        })
        .collect()
}
