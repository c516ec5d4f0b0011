//! Tool catalogue: names, descriptions and input schemas.

use schemars::schema_for;
use serde::Serialize;
use serde_json::{json, Value};

use super::args::{
    AnalyzeArgs, DetailArgs, ExpandArgs, ExportArgs, ListArgs, LoadArgs, OverviewArgs, SearchArgs,
};
use crate::error::{HarError, Result};

/// Maximum schema violations reported for one call.
const MAX_REPORTED_ERRORS: usize = 5;

/// The operations exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Load and index a capture.
    Load,
    /// Dashboard of the active capture.
    Overview,
    /// Filtered entry listing.
    List,
    /// One entry in detail.
    Detail,
    /// Full content behind a ref.
    Expand,
    /// Text search.
    Search,
    /// Heuristic analyses.
    Analyze,
    /// Export planning.
    Export,
}

impl Tool {
    /// Every tool, in presentation order.
    pub const ALL: [Self; 8] = [
        Self::Load,
        Self::Overview,
        Self::List,
        Self::Detail,
        Self::Expand,
        Self::Search,
        Self::Analyze,
        Self::Export,
    ];

    /// Protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Load => "har_load",
            Self::Overview => "har_overview",
            Self::List => "har_list",
            Self::Detail => "har_detail",
            Self::Expand => "har_expand",
            Self::Search => "har_search",
            Self::Analyze => "har_analyze",
            Self::Export => "har_export",
        }
    }

    /// Look a tool up by protocol name or bare operation name.
    pub fn from_name(name: &str) -> Option<Self> {
        let bare = name.strip_prefix("har_").unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|tool| tool.name().strip_prefix("har_") == Some(bare))
    }

    /// Description shown to agents.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Load => {
                "Load and index a HAR capture file. Replaces any previously loaded capture \
                 and returns a dashboard summary. Call this first."
            }
            Self::Overview => {
                "Show the dashboard summary (entry counts, status buckets, domains) of the \
                 loaded capture."
            }
            Self::List => {
                "List entries as `[e<idx>] METHOD path status`, filtered by domain (exact or \
                 glob), status (404 or 4xx), method and URL substring."
            }
            Self::Detail => {
                "Show one entry. Large sections are previewed with a ref id; pass `section` \
                 for one section, `raw` for the whole entry as JSON, or `full` to disable \
                 previews."
            }
            Self::Expand => "Return the full content behind a ref id such as e14.response.body.",
            Self::Search => {
                "Case-insensitive text search in URLs, headers and/or bodies. Returns matching \
                 entries with context."
            }
            Self::Analyze => {
                "Run a heuristic analysis: `errors` (failed requests with body snippets), \
                 `security` (bearer JWTs, secret query parameters) or `slow`."
            }
            Self::Export => {
                "Plan an export of matching entries, optionally sanitized or without bodies. \
                 Returns the plan summary."
            }
        }
    }

    /// JSON Schema of the tool's arguments.
    pub fn input_schema(self) -> Value {
        let schema = match self {
            Self::Load => schema_for!(LoadArgs),
            Self::Overview => schema_for!(OverviewArgs),
            Self::List => schema_for!(ListArgs),
            Self::Detail => schema_for!(DetailArgs),
            Self::Expand => schema_for!(ExpandArgs),
            Self::Search => schema_for!(SearchArgs),
            Self::Analyze => schema_for!(AnalyzeArgs),
            Self::Export => schema_for!(ExportArgs),
        };
        serde_json::to_value(schema).unwrap_or_else(|_| json!({ "type": "object" }))
    }

    /// Check `args` against the input schema.
    pub fn validate(self, args: &Value) -> Result<()> {
        let schema = self.input_schema();
        let validator = jsonschema::validator_for(&schema).map_err(|e| HarError::InvalidConfig {
            message: format!("schema for {}: {e}", self.name()),
        })?;

        if validator.is_valid(args) {
            return Ok(());
        }
        let errors: Vec<String> = validator
            .iter_errors(args)
            .take(MAX_REPORTED_ERRORS)
            .map(|e| e.to_string())
            .collect();
        Err(HarError::invalid_argument(
            "arguments",
            self.name(),
            errors.join("; "),
        ))
    }
}

/// Description of one tool for protocol listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Protocol name.
    pub name: &'static str,
    /// Description.
    pub description: &'static str,
    /// JSON Schema of the arguments.
    pub input_schema: Value,
}

/// Definitions of every tool.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    Tool::ALL
        .into_iter()
        .map(|tool| ToolDefinition {
            name: tool.name(),
            description: tool.description(),
            input_schema: tool.input_schema(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Tool::from_name("har_list"), Some(Tool::List));
        assert_eq!(Tool::from_name("expand"), Some(Tool::Expand));
        assert_eq!(Tool::from_name("har_nope"), None);
    }

    #[test]
    fn test_definitions_have_object_schemas() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 8);
        for def in defs {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
        }
    }

    #[test]
    fn test_required_fields() {
        let schema = Tool::Expand.input_schema();
        assert_eq!(schema["required"], json!(["ref"]));
        let schema = Tool::Analyze.input_schema();
        assert_eq!(schema["required"], json!(["type"]));
    }

    #[test]
    fn test_validate() {
        assert!(Tool::Load.validate(&json!({"file": "a.har"})).is_ok());
        assert!(Tool::Overview.validate(&json!({})).is_ok());
        assert!(Tool::List.validate(&json!({"status": "4xx", "limit": 3})).is_ok());
        assert!(Tool::List.validate(&json!({"status": 404})).is_ok());

        let err = Tool::Load.validate(&json!({})).unwrap_err();
        assert!(matches!(err, HarError::InvalidArgument { .. }));
        assert!(err.to_string().contains("har_load"));

        assert!(Tool::List.validate(&json!({"limit": "ten"})).is_err());
        assert!(Tool::Detail.validate(&json!({"entry": 1, "bogus": true})).is_err());
    }
}
