//! Typed operation arguments.
//!
//! These types are the single source of truth for both deserialization and
//! the JSON Schema advertised for each tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{HarError, Result};
use crate::query::{EntryFilter, SearchScope, StatusArg, StatusFilter};

/// Arguments of `load`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoadArgs {
    /// Path to the HAR capture file.
    pub file: String,
}

/// Arguments of `overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OverviewArgs {}

/// Arguments of `list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListArgs {
    /// Domain, exact or glob such as `*.example.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Status code (`404`) or bucket (`4xx`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusArg>,
    /// HTTP method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Case-sensitive URL substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Maximum entries to return (default 50).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ListArgs {
    /// Convert into filter criteria.
    pub fn to_filter(&self) -> Result<EntryFilter> {
        Ok(EntryFilter {
            domain: self.domain.clone(),
            status: parse_status(self.status.as_ref())?,
            method: self.method.clone(),
            url: self.url.clone(),
            limit: positive_limit(self.limit)?,
        })
    }
}

/// An entry addressed by index (`14`) or label (`"e14"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum EntryArg {
    /// 0-based index.
    Index(usize),
    /// `e<index>` label.
    Label(String),
}

impl EntryArg {
    /// Resolve to an entry index.
    pub fn index(&self) -> Result<usize> {
        match self {
            Self::Index(index) => Ok(*index),
            Self::Label(label) => {
                let trimmed = label.trim();
                let digits = trimmed
                    .strip_prefix('e')
                    .or_else(|| trimmed.strip_prefix('E'))
                    .unwrap_or(trimmed);
                digits.parse().map_err(|_| {
                    HarError::invalid_argument(
                        "entry",
                        label,
                        "expected an index such as 14 or e14",
                    )
                })
            }
        }
    }
}

/// Arguments of `detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DetailArgs {
    /// Entry index or `e<index>` label.
    pub entry: EntryArg,
    /// Return the whole entry as JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
    /// Return a single section, e.g. `response.body`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Return content in full instead of previews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full: Option<bool>,
}

impl DetailArgs {
    /// Structured detail of one entry.
    pub fn entry(index: usize) -> Self {
        Self {
            entry: EntryArg::Index(index),
            raw: None,
            section: None,
            full: None,
        }
    }

    /// Restrict to one section.
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

/// Arguments of `expand`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExpandArgs {
    /// Ref id such as `e14.response.body`.
    #[serde(rename = "ref")]
    pub reference: String,
}

impl ExpandArgs {
    /// Expand the given ref id.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// Arguments of `search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchArgs {
    /// Text to look for, case-insensitively.
    pub query: String,
    /// Where to look (default `all`).
    #[serde(default)]
    pub scope: SearchScope,
    /// Restrict to a domain, exact or glob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Maximum matches to return (default 50).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SearchArgs {
    /// Requested match limit, if any.
    pub fn limit(&self) -> Result<Option<usize>> {
        positive_limit(self.limit)
    }
}

/// Arguments of `analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AnalyzeArgs {
    /// Analysis to run: `errors`, `security` or `slow`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Slow-request threshold in milliseconds (`slow` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_ms: Option<f64>,
    /// Maximum findings to list (default 50).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl AnalyzeArgs {
    /// Run the named analysis with default settings.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            threshold_ms: None,
            limit: None,
        }
    }

    /// Requested finding limit, if any.
    pub fn limit(&self) -> Result<Option<usize>> {
        positive_limit(self.limit)
    }
}

/// Arguments of `export`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ExportArgs {
    /// Domain, exact or glob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Status code or bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusArg>,
    /// Replace credentials with `[REDACTED]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitize: Option<bool>,
    /// Drop request and response bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_bodies: Option<bool>,
}

impl ExportArgs {
    /// Parsed status criterion.
    pub fn status_filter(&self) -> Result<Option<StatusFilter>> {
        parse_status(self.status.as_ref())
    }
}

fn positive_limit(limit: Option<usize>) -> Result<Option<usize>> {
    match limit {
        Some(0) => Err(HarError::invalid_argument("limit", "0", "must be greater than 0")),
        other => Ok(other),
    }
}

fn parse_status(status: Option<&StatusArg>) -> Result<Option<StatusFilter>> {
    status.map(StatusArg::to_filter).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_arg() {
        assert_eq!(EntryArg::Index(3).index().unwrap(), 3);
        assert_eq!(EntryArg::Label("e14".into()).index().unwrap(), 14);
        assert_eq!(EntryArg::Label("7".into()).index().unwrap(), 7);
        assert!(EntryArg::Label("entry".into()).index().is_err());
    }

    #[test]
    fn test_wire_names() {
        let expand: ExpandArgs = serde_json::from_value(json!({"ref": "e1.request.body"})).unwrap();
        assert_eq!(expand.reference, "e1.request.body");

        let analyze: AnalyzeArgs = serde_json::from_value(json!({"type": "errors"})).unwrap();
        assert_eq!(analyze.kind, "errors");

        let export: ExportArgs =
            serde_json::from_value(json!({"stripBodies": true, "status": "5xx"})).unwrap();
        assert_eq!(export.strip_bodies, Some(true));
        assert_eq!(export.status_filter().unwrap(), Some(StatusFilter::Bucket(5)));
    }

    #[test]
    fn test_list_args_status_number_or_string() {
        let args: ListArgs = serde_json::from_value(json!({"status": 404})).unwrap();
        assert_eq!(args.to_filter().unwrap().status, Some(StatusFilter::Exact(404)));

        let args: ListArgs = serde_json::from_value(json!({"status": "2xx", "limit": 5})).unwrap();
        let filter = args.to_filter().unwrap();
        assert_eq!(filter.status, Some(StatusFilter::Bucket(2)));
        assert_eq!(filter.limit, Some(5));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let list: ListArgs = serde_json::from_value(json!({"limit": 0})).unwrap();
        let err = list.to_filter().unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument 'limit': 0 (must be greater than 0)");

        let search: SearchArgs = serde_json::from_value(json!({"query": "x", "limit": 0})).unwrap();
        assert!(search.limit().is_err());

        let analyze: AnalyzeArgs =
            serde_json::from_value(json!({"type": "errors", "limit": 0})).unwrap();
        assert!(analyze.limit().is_err());
        assert_eq!(AnalyzeArgs::new("slow").limit().unwrap(), None);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_json::from_value::<LoadArgs>(json!({"file": "a.har", "x": 1})).is_err());
    }

    #[test]
    fn test_search_scope_defaults_to_all() {
        let args: SearchArgs = serde_json::from_value(json!({"query": "x"})).unwrap();
        assert_eq!(args.scope, SearchScope::All);
    }
}
