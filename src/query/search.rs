//! Case-insensitive text search across entries.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::DomainMatcher;
use crate::error::{HarError, Result};
use crate::format::collapse_whitespace;
use crate::model::{Entry, Har, IndexedEntry, NameValue};

/// Characters of context kept on each side of a hit.
pub const CONTEXT_CHARS: usize = 40;

/// Which parts of an entry a search looks at.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Request URL.
    Url,
    /// Request and response headers.
    Headers,
    /// Request and response bodies.
    Body,
    /// Everything above.
    #[default]
    All,
}

impl SearchScope {
    fn includes(self, other: Self) -> bool {
        self == Self::All || self == other
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Url => "url",
            Self::Headers => "headers",
            Self::Body => "body",
            Self::All => "all",
        })
    }
}

impl FromStr for SearchScope {
    type Err = HarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(Self::Url),
            "headers" => Ok(Self::Headers),
            "body" => Ok(Self::Body),
            "all" => Ok(Self::All),
            _ => Err(HarError::invalid_argument(
                "scope",
                s,
                "expected one of url, headers, body, all",
            )),
        }
    }
}

/// One matching entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    /// The matching entry.
    pub entry: &'a IndexedEntry,
    /// Where the first hit was found.
    pub scope: SearchScope,
    /// Text around the first hit, whitespace collapsed.
    pub context: String,
}

/// Compiled search.
#[derive(Debug, Clone)]
pub struct Search {
    pattern: Regex,
    scope: SearchScope,
    domain: Option<DomainMatcher>,
}

impl Search {
    /// Compile a literal, case-insensitive search.
    pub fn new(query: &str, scope: SearchScope, domain: Option<&str>) -> Result<Self> {
        if query.trim().is_empty() {
            return Err(HarError::invalid_argument("query", query, "must not be empty"));
        }
        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .map_err(|e| HarError::invalid_argument("query", query, e.to_string()))?;
        Ok(Self {
            pattern,
            scope,
            domain: domain.map(DomainMatcher::new).transpose()?,
        })
    }

    /// Every entry with at least one hit, in file order.
    pub fn run<'a>(&self, entries: &'a [IndexedEntry], har: &Har) -> Vec<SearchHit<'a>> {
        entries
            .iter()
            .filter(|e| self.domain.as_ref().map_or(true, |d| d.matches(&e.domain)))
            .filter_map(|indexed| {
                let raw = har.entry(indexed.index)?;
                let (scope, context) = self.first_hit(raw)?;
                Some(SearchHit {
                    entry: indexed,
                    scope,
                    context,
                })
            })
            .collect()
    }

    fn first_hit(&self, entry: &Entry) -> Option<(SearchScope, String)> {
        if self.scope.includes(SearchScope::Url) {
            if let Some(context) = self.context_in(&entry.request.url) {
                return Some((SearchScope::Url, context));
            }
        }
        if self.scope.includes(SearchScope::Headers) {
            let headers = [&entry.request.headers, &entry.response.headers];
            for list in headers {
                if let Some(context) = self.context_in(&header_block(list)) {
                    return Some((SearchScope::Headers, context));
                }
            }
        }
        if self.scope.includes(SearchScope::Body) {
            let request_body = entry.request.post_data.as_ref().map(|p| p.body());
            let response_body = entry.response.content.body();
            for body in request_body.iter().chain(std::iter::once(&response_body)) {
                if let Some(context) = body.as_text().and_then(|t| self.context_in(t)) {
                    return Some((SearchScope::Body, context));
                }
            }
        }
        None
    }

    fn context_in(&self, text: &str) -> Option<String> {
        let found = self.pattern.find(text)?;
        Some(context_around(text, found.start(), found.end(), CONTEXT_CHARS))
    }
}

fn header_block(headers: &[NameValue]) -> String {
    headers
        .iter()
        .map(|h| format!("{}: {}", h.name, h.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Up to `radius` characters either side of `text[start..end]`.
pub fn context_around(text: &str, start: usize, end: usize, radius: usize) -> String {
    let before: Vec<char> = text[..start].chars().rev().take(radius + 1).collect();
    let after: Vec<char> = text[end..].chars().take(radius + 1).collect();

    let mut out = String::new();
    if before.len() > radius {
        out.push_str("...");
    }
    out.extend(before.iter().take(radius).rev());
    out.push_str(&text[start..end]);
    out.extend(after.iter().take(radius));
    if after.len() > radius {
        out.push_str("...");
    }
    collapse_whitespace(&out)
}
