//! Operation surface shared by the CLI and the tool server.
//!
//! [`Inspector`] exposes every operation twice:
//! - `try_*` methods return [`Result`] for callers that want typed errors
//!   (the CLI maps them to exit codes)
//! - the plain methods and [`Inspector::call`] return a [`ToolResult`] and
//!   never fail: every error becomes error-flagged text
//!
//! Each call except `load` resolves the active session from disk, so
//! separate processes sharing a sessions directory see the same capture.

mod args;
mod tools;

pub use args::{
    AnalyzeArgs, DetailArgs, EntryArg, ExpandArgs, ExportArgs, ListArgs, LoadArgs, OverviewArgs,
    SearchArgs,
};
pub use tools::{tool_definitions, Tool, ToolDefinition};

use std::fmt::Write as _;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::analysis::{self, AnalysisType};
use crate::config::{AnalysisConfig, Config, DisplayConfig};
use crate::error::{HarError, Result};
use crate::export::{ExportOptions, ExportPlan};
use crate::format::{dashboard, entry_line, format_bytes, format_duration};
use crate::model::{Entry, Har, IndexedEntry};
use crate::query::{filter, Search};
use crate::refs::{ContentSection, RefId, RefStore};
use crate::session::{Session, SessionManager};

/// Outcome of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    /// Result or error text.
    pub text: String,
    /// Whether `text` describes a failure.
    pub is_error: bool,
}

impl ToolResult {
    /// A successful result.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// A failed result.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

impl From<Result<String>> for ToolResult {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::ok(text),
            Err(e) => {
                if e.is_guidance() {
                    debug!(error = %e, "Operation needs caller action");
                } else {
                    warn!(error = %e, "Operation failed");
                }
                Self::error(e.to_string())
            }
        }
    }
}

/// The capture inspector.
#[derive(Debug)]
pub struct Inspector {
    sessions: SessionManager,
    refs: RefStore,
    display: DisplayConfig,
    analysis: AnalysisConfig,
}

impl Inspector {
    /// Create an inspector over an explicit session manager.
    pub fn new(sessions: SessionManager, config: &Config) -> Self {
        Self {
            sessions,
            refs: RefStore::from_config(&config.display),
            display: config.display.clone(),
            analysis: config.analysis.clone(),
        }
    }

    /// Create an inspector entirely from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(SessionManager::from_config(&config.sessions)?, config))
    }

    /// The session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// The ref store.
    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// Display settings.
    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    fn current(&self) -> Result<Session> {
        let session = self.sessions.load_session(None)?;
        self.refs.bind(session.id());
        Ok(session)
    }

    fn current_with_capture(&self) -> Result<(Session, Har)> {
        let (session, har) = self.sessions.open(None)?;
        self.refs.bind(session.id());
        Ok((session, har))
    }

    // ------------------------------------------------------------------
    // Typed operations
    // ------------------------------------------------------------------

    /// Load a capture and make it the active session.
    #[instrument(skip(self), fields(file = %args.file))]
    pub fn try_load(&self, args: &LoadArgs) -> Result<String> {
        let session = self.sessions.create_session(&args.file)?;
        self.refs.clear();
        self.refs.bind(session.id());
        Ok(dashboard(&session))
    }

    /// Dashboard of the active session.
    pub fn try_overview(&self) -> Result<String> {
        Ok(dashboard(&self.current()?))
    }

    /// Filtered entry lines.
    pub fn try_list(&self, args: &ListArgs) -> Result<String> {
        let session = self.current()?;
        let mut criteria = args.to_filter()?;
        let limit = criteria.limit.take().unwrap_or(self.display.default_limit);

        let matching = filter(&session.entries, &criteria)?;
        if matching.is_empty() {
            return Ok("No entries match.".to_string());
        }

        let mut out = self.lines(matching.iter().take(limit).copied());
        if matching.len() > limit {
            let _ = write!(
                out,
                "\n... showing {limit} of {} matching entries",
                matching.len()
            );
        }
        Ok(out)
    }

    /// One entry: structured, a single section, or raw JSON.
    pub fn try_detail(&self, args: &DetailArgs) -> Result<String> {
        let index = args.entry.index()?;
        let section = match (&args.section, args.raw.unwrap_or(false)) {
            (_, true) => Some(ContentSection::EntryRaw),
            (Some(section), false) => Some(section.parse::<ContentSection>()?),
            (None, false) => None,
        };
        let full = args.full.unwrap_or(false);

        let (session, har) = self.current_with_capture()?;
        let (Some(indexed), Some(raw)) = (session.entry(index), har.entry(index)) else {
            return Err(HarError::EntryNotFound { index });
        };

        Ok(match section {
            Some(section) => self.section_text(raw, RefId::new(index, section), full),
            None => self.detail_text(indexed, raw, full),
        })
    }

    /// Full content behind a ref id.
    #[instrument(skip(self), fields(reference = %args.reference))]
    pub fn try_expand(&self, args: &ExpandArgs) -> Result<String> {
        let id: RefId = args.reference.parse()?;
        let (_, har) = self.current_with_capture()?;
        self.refs
            .expand(&id.to_string(), &har)
            .ok_or_else(|| HarError::RefNotFound {
                ref_id: args.reference.trim().to_string(),
            })
    }

    /// Entries whose URL, headers or bodies contain the query.
    pub fn try_search(&self, args: &SearchArgs) -> Result<String> {
        let search = Search::new(&args.query, args.scope, args.domain.as_deref())?;
        let limit = args.limit()?.unwrap_or(self.display.default_limit);
        let (session, har) = self.current_with_capture()?;

        let hits = search.run(&session.entries, &har);
        if hits.is_empty() {
            return Ok(format!("No matches for \"{}\"", args.query));
        }

        let lines: Vec<String> = hits
            .iter()
            .take(limit)
            .map(|hit| {
                format!(
                    "{} -> {}",
                    entry_line(hit.entry, self.display.path_width),
                    hit.context
                )
            })
            .collect();
        let mut out = lines.join("\n");
        if hits.len() > limit {
            let _ = write!(out, "\n... showing {limit} of {} matches", hits.len());
        }
        Ok(out)
    }

    /// Run an analysis over every entry.
    pub fn try_analyze(&self, args: &AnalyzeArgs) -> Result<String> {
        let kind: AnalysisType = args.kind.parse()?;
        let limit = args.limit()?.unwrap_or(self.display.default_limit);
        let width = self.display.path_width;

        Ok(match kind {
            AnalysisType::Errors => {
                let (session, har) = self.current_with_capture()?;
                let findings =
                    analysis::find_errors(&session.entries, &har, self.display.snippet_length);
                analysis::render_errors(&findings, width, limit)
            }
            AnalysisType::Security => {
                let (session, har) = self.current_with_capture()?;
                let findings = analysis::find_security_issues(&session.entries, &har);
                analysis::render_security(&findings, width, limit)
            }
            AnalysisType::Slow => {
                let session = self.current()?;
                let threshold = args.threshold_ms.unwrap_or(self.analysis.slow_threshold_ms);
                let slow = analysis::find_slow(&session.entries, threshold);
                analysis::render_slow(&slow, threshold, width, limit)
            }
        })
    }

    /// Decide what an export would contain.
    pub fn plan_export(&self, args: &ExportArgs) -> Result<(Session, ExportPlan)> {
        let options = ExportOptions {
            domain: args.domain.clone(),
            status: args.status_filter()?,
            sanitize: args.sanitize.unwrap_or(false),
            strip_bodies: args.strip_bodies.unwrap_or(false),
        };
        let session = self.current()?;
        let plan = ExportPlan::new(&session, options)?;
        Ok((session, plan))
    }

    /// Export plan summary.
    pub fn try_export(&self, args: &ExportArgs) -> Result<String> {
        Ok(self.plan_export(args)?.1.summary())
    }

    // ------------------------------------------------------------------
    // Infallible surface
    // ------------------------------------------------------------------

    /// `load`, as a tool result.
    pub fn load(&self, args: &LoadArgs) -> ToolResult {
        self.try_load(args).into()
    }

    /// `overview`, as a tool result.
    pub fn overview(&self) -> ToolResult {
        self.try_overview().into()
    }

    /// `list`, as a tool result.
    pub fn list(&self, args: &ListArgs) -> ToolResult {
        self.try_list(args).into()
    }

    /// `detail`, as a tool result.
    pub fn detail(&self, args: &DetailArgs) -> ToolResult {
        self.try_detail(args).into()
    }

    /// `expand`, as a tool result.
    pub fn expand(&self, args: &ExpandArgs) -> ToolResult {
        self.try_expand(args).into()
    }

    /// `search`, as a tool result.
    pub fn search(&self, args: &SearchArgs) -> ToolResult {
        self.try_search(args).into()
    }

    /// `analyze`, as a tool result.
    pub fn analyze(&self, args: &AnalyzeArgs) -> ToolResult {
        self.try_analyze(args).into()
    }

    /// `export`, as a tool result.
    pub fn export(&self, args: &ExportArgs) -> ToolResult {
        self.try_export(args).into()
    }

    /// Dispatch a call by tool name with JSON arguments.
    ///
    /// Arguments are validated against the tool's schema first; violations
    /// are reported as error results.
    pub fn call(&self, name: &str, args: Value) -> ToolResult {
        self.try_call(name, args).into()
    }

    fn try_call(&self, name: &str, args: Value) -> Result<String> {
        let tool = Tool::from_name(name)
            .ok_or_else(|| HarError::invalid_argument("tool", name, "unknown tool"))?;
        let args = if args.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            args
        };
        tool.validate(&args)?;

        match tool {
            Tool::Load => self.try_load(&decode(tool, args)?),
            Tool::Overview => {
                let _: OverviewArgs = decode(tool, args)?;
                self.try_overview()
            }
            Tool::List => self.try_list(&decode(tool, args)?),
            Tool::Detail => self.try_detail(&decode(tool, args)?),
            Tool::Expand => self.try_expand(&decode(tool, args)?),
            Tool::Search => self.try_search(&decode(tool, args)?),
            Tool::Analyze => self.try_analyze(&decode(tool, args)?),
            Tool::Export => self.try_export(&decode(tool, args)?),
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn lines<'a>(&self, entries: impl Iterator<Item = &'a IndexedEntry>) -> String {
        entries
            .map(|e| entry_line(e, self.display.path_width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn section_text(&self, raw: &Entry, id: RefId, full: bool) -> String {
        match id.section.render(raw) {
            Some(rendered) => self.refs.present_rendered(rendered, &id, full),
            None => format!("{id} is empty."),
        }
    }

    fn detail_text(&self, indexed: &IndexedEntry, raw: &Entry, full: bool) -> String {
        let mut out = entry_line(indexed, self.display.path_width);
        let _ = write!(out, "\nURL: {}", indexed.url);

        let status_text = raw.response.status_text.trim();
        let _ = write!(out, "\nStatus: {}", indexed.status);
        if !status_text.is_empty() {
            let _ = write!(out, " {status_text}");
        }
        let _ = write!(
            out,
            " | Time: {} | Size: {}",
            format_duration(indexed.time_ms),
            format_bytes(indexed.response_size)
        );
        if let Some(mime) = &indexed.mime_type {
            let _ = write!(out, " | Type: {mime}");
        }
        if let Some(started) = &indexed.started {
            let _ = write!(out, "\nStarted: {started}");
        }
        if let Some(redirect) = raw.response.redirect_url.as_deref().filter(|r| !r.is_empty()) {
            let _ = write!(out, "\nRedirect: {redirect}");
        }

        for section in ContentSection::DETAIL {
            let Some(rendered) = section.render(raw) else {
                continue;
            };
            let id = RefId::new(indexed.index, section);
            let _ = write!(
                out,
                "\n\n{} ({id}):\n{}",
                section.title(),
                self.refs.present_rendered(rendered, &id, full)
            );
        }
        out
    }
}

fn decode<T: DeserializeOwned>(tool: Tool, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| HarError::invalid_argument("arguments", tool.name(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    const CAPTURE: &str = r#"{"log":{"entries":[
        {"time":12,"request":{"method":"GET","url":"https://a.com/x",
            "headers":[{"name":"Accept","value":"*/*"}]},
         "response":{"status":500,"statusText":"Internal Server Error",
            "content":{"size":4,"mimeType":"text/plain","text":"oops"}}}
    ]}}"#;

    fn setup() -> (TempDir, Inspector, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionManager::new(dir.path().join("sessions"), Duration::from_secs(3600));
        let inspector = Inspector::new(sessions, &Config::default());
        let capture = dir.path().join("capture.har");
        std::fs::write(&capture, CAPTURE).unwrap();
        (dir, inspector, capture)
    }

    fn load(inspector: &Inspector, capture: &std::path::Path) {
        let result = inspector.load(&LoadArgs {
            file: capture.display().to_string(),
        });
        assert!(!result.is_error, "{}", result.text);
    }

    #[test]
    fn test_operations_before_load() {
        let (_dir, inspector, _) = setup();
        let result = inspector.overview();
        assert!(result.is_error);
        assert_eq!(result.text, HarError::NoSession.to_string());
    }

    #[test]
    fn test_load_returns_dashboard() {
        let (_dir, inspector, capture) = setup();
        let result = inspector.load(&LoadArgs {
            file: capture.display().to_string(),
        });
        assert!(!result.is_error);
        assert!(result.text.contains("Entries: 1 | Errors: 1"));
    }

    #[test]
    fn test_load_missing_file() {
        let (_dir, inspector, _) = setup();
        let result = inspector.load(&LoadArgs {
            file: "/nope/missing.har".into(),
        });
        assert!(result.is_error);
        assert!(result.text.contains("/nope/missing.har"));
    }

    #[test]
    fn test_detail_structured() {
        let (_dir, inspector, capture) = setup();
        load(&inspector, &capture);

        let text = inspector.detail(&DetailArgs::entry(0)).text;
        assert!(text.starts_with("[e0] GET /x 500\nURL: https://a.com/x"));
        assert!(text.contains("Status: 500 Internal Server Error"));
        assert!(text.contains("Request headers (e0.request.headers):\nAccept: */*"));
        assert!(text.contains("Response body (e0.response.body):\noops"));
        assert!(!text.contains("Request body"));
    }

    #[test]
    fn test_detail_out_of_range() {
        let (_dir, inspector, capture) = setup();
        load(&inspector, &capture);
        let result = inspector.detail(&DetailArgs::entry(9));
        assert!(result.is_error);
        assert_eq!(result.text, "Entry e9 not found.");
    }

    #[test]
    fn test_detail_unknown_section() {
        let (_dir, inspector, capture) = setup();
        load(&inspector, &capture);
        let result = inspector.detail(&DetailArgs::entry(0).with_section("response.nope"));
        assert!(result.is_error);
        assert!(result.text.contains("response.nope"));
    }

    #[test]
    fn test_detail_empty_section() {
        let (_dir, inspector, capture) = setup();
        load(&inspector, &capture);
        let result = inspector.detail(&DetailArgs::entry(0).with_section("request.body"));
        assert!(!result.is_error);
        assert_eq!(result.text, "e0.request.body is empty.");
    }

    #[test]
    fn test_expand_errors() {
        let (_dir, inspector, capture) = setup();
        let result = inspector.expand(&ExpandArgs::new("bogus"));
        assert!(result.is_error);
        assert_eq!(result.text, "Invalid ref format: bogus");

        load(&inspector, &capture);
        let result = inspector.expand(&ExpandArgs::new("e5.response.body"));
        assert!(result.is_error);
        assert_eq!(result.text, "No content found for ref e5.response.body");
    }

    #[test]
    fn test_search() {
        let (_dir, inspector, capture) = setup();
        load(&inspector, &capture);

        let result = inspector.call("har_search", json!({"query": "OOPS"}));
        assert_eq!(result.text, "[e0] GET /x 500 -> oops");

        let result = inspector.call("har_search", json!({"query": "zzz"}));
        assert!(!result.is_error);
        assert_eq!(result.text, "No matches for \"zzz\"");
    }

    #[test]
    fn test_analyze_unknown_type() {
        let (_dir, inspector, capture) = setup();
        load(&inspector, &capture);
        let result = inspector.analyze(&AnalyzeArgs::new("perf"));
        assert!(result.is_error);
        assert!(result.text.starts_with("Unknown analysis type: perf"));
    }

    #[test]
    fn test_export_plan() {
        let (_dir, inspector, capture) = setup();
        load(&inspector, &capture);
        let result = inspector.call("har_export", json!({"status": "2xx", "sanitize": true}));
        assert!(!result.is_error);
        assert!(result.text.starts_with("Export plan: 0 of 1 entries"));
        assert!(result.text.contains("Sanitize: yes"));
    }

    #[test]
    fn test_call_validation() {
        let (_dir, inspector, _) = setup();

        let result = inspector.call("har_detail", json!({"entry": 0, "extra": 1}));
        assert!(result.is_error);
        assert!(result.text.starts_with("Invalid argument 'arguments': har_detail"));

        let result = inspector.call("har_teleport", Value::Null);
        assert!(result.is_error);
        assert!(result.text.contains("unknown tool"));

        let result = inspector.call("har_overview", Value::Null);
        assert_eq!(result.text, HarError::NoSession.to_string());
    }

    #[test]
    fn test_reload_replaces_session_and_refs() {
        let (dir, inspector, capture) = setup();
        let big = dir.path().join("big.har");
        let body = "y".repeat(5000);
        std::fs::write(
            &big,
            format!(
                r#"{{"log":{{"entries":[{{"time":1,"request":{{"method":"GET","url":"https://b.com/"}},
                   "response":{{"status":200,"content":{{"text":"{body}"}}}}}}]}}}}"#
            ),
        )
        .unwrap();

        load(&inspector, &big);
        inspector.detail(&DetailArgs::entry(0));
        assert_eq!(inspector.refs().len(), 1);

        load(&inspector, &capture);
        assert!(inspector.refs().is_empty());
        assert!(inspector.overview().text.contains("capture.har"));
    }
}
