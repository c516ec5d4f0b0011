//! Entry filtering.
//!
//! Filters are pure predicates over the persisted index. Criteria combine
//! conjunctively and are applied in a fixed order: domain, status, method,
//! url, then the limit. Free-text search over raw entries lives in
//! [`Search`].

mod search;

pub use search::{context_around, Search, SearchHit, SearchScope, CONTEXT_CHARS};

use std::fmt;
use std::str::FromStr;

use globset::{GlobBuilder, GlobMatcher};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{HarError, Result};
use crate::model::IndexedEntry;

/// Status criterion: an exact code or a hundred-wide bucket such as `4xx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Exact status code.
    Exact(u16),
    /// `<n>xx`: codes `n*100 ..= n*100 + 99`.
    Bucket(u16),
}

impl StatusFilter {
    /// Whether `status` satisfies this criterion.
    pub const fn matches(self, status: u16) -> bool {
        match self {
            Self::Exact(code) => status == code,
            Self::Bucket(hundreds) => status / 100 == hundreds,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = HarError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        let invalid = || {
            HarError::invalid_argument(
                "status",
                s,
                "expected a status code such as 404 or a bucket such as 4xx",
            )
        };

        let lower = value.to_ascii_lowercase();
        if let Some(digit) = lower.strip_suffix("xx") {
            return match digit.as_bytes() {
                [d @ b'1'..=b'5'] => Ok(Self::Bucket(u16::from(d - b'0'))),
                _ => Err(invalid()),
            };
        }

        value
            .parse::<u16>()
            .ok()
            .filter(|code| *code <= 999)
            .map(Self::Exact)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(code) => write!(f, "{code}"),
            Self::Bucket(hundreds) => write!(f, "{hundreds}xx"),
        }
    }
}

/// Status as it arrives over the tool protocol: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StatusArg {
    /// Exact code, e.g. `404`.
    Code(u16),
    /// Code or bucket as text, e.g. `"4xx"`.
    Pattern(String),
}

impl StatusArg {
    /// Parse into a status criterion.
    pub fn to_filter(&self) -> Result<StatusFilter> {
        match self {
            Self::Code(code) => format!("{code}").parse(),
            Self::Pattern(pattern) => pattern.parse(),
        }
    }
}

/// Transient query criteria. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    /// Exact domain (case-insensitive) or glob such as `*.example.com`.
    pub domain: Option<String>,
    /// Status code or bucket.
    pub status: Option<StatusFilter>,
    /// HTTP method, case-insensitive.
    pub method: Option<String>,
    /// Case-sensitive URL substring.
    pub url: Option<String>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl EntryFilter {
    /// Filter on domain only.
    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..Self::default()
        }
    }

    /// Whether no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.domain.is_none()
            && self.status.is_none()
            && self.method.is_none()
            && self.url.is_none()
            && self.limit.is_none()
    }
}

/// Domain criterion.
#[derive(Debug, Clone)]
pub enum DomainMatcher {
    /// Case-insensitive equality.
    Exact(String),
    /// Case-insensitive glob.
    Glob(GlobMatcher),
}

impl DomainMatcher {
    /// Build a matcher; patterns containing glob metacharacters become globs.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        if !pattern.contains(['*', '?', '[', '{']) {
            return Ok(Self::Exact(pattern.to_ascii_lowercase()));
        }
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
            .map_err(|e| HarError::invalid_argument("domain", pattern, e.kind().to_string()))?;
        Ok(Self::Glob(glob.compile_matcher()))
    }

    /// Whether `domain` satisfies this matcher.
    pub fn matches(&self, domain: &str) -> bool {
        match self {
            Self::Exact(expected) => domain.eq_ignore_ascii_case(expected),
            Self::Glob(glob) => glob.is_match(domain),
        }
    }
}

/// An [`EntryFilter`] with its domain pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    domain: Option<DomainMatcher>,
    status: Option<StatusFilter>,
    method: Option<String>,
    url: Option<String>,
    limit: Option<usize>,
}

impl CompiledFilter {
    /// Compile criteria once for repeated matching.
    pub fn new(criteria: &EntryFilter) -> Result<Self> {
        Ok(Self {
            domain: criteria.domain.as_deref().map(DomainMatcher::new).transpose()?,
            status: criteria.status,
            method: criteria.method.as_ref().map(|m| m.trim().to_string()),
            url: criteria.url.clone(),
            limit: criteria.limit,
        })
    }

    /// Whether one entry satisfies every criterion except the limit.
    pub fn matches(&self, entry: &IndexedEntry) -> bool {
        if let Some(domain) = &self.domain {
            if !domain.matches(&entry.domain) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if !status.matches(entry.status) {
                return false;
            }
        }
        if let Some(method) = &self.method {
            if !entry.method.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        if let Some(url) = &self.url {
            if !entry.url.contains(url.as_str()) {
                return false;
            }
        }
        true
    }

    /// Apply the filter to `entries`, preserving order.
    pub fn apply<'a>(&self, entries: &'a [IndexedEntry]) -> Vec<&'a IndexedEntry> {
        let matching = entries.iter().filter(|e| self.matches(e));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

/// Filter `entries` by `criteria` in one linear pass.
pub fn filter<'a>(
    entries: &'a [IndexedEntry],
    criteria: &EntryFilter,
) -> Result<Vec<&'a IndexedEntry>> {
    Ok(CompiledFilter::new(criteria)?.apply(entries))
}
