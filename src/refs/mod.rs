//! Content virtualization behind short ref ids.
//!
//! Large sections (bodies, long header blocks, raw entries) are returned as
//! a preview plus a ref id such as `e14.response.body`. The ref id is a
//! content address: expanding it re-renders the section from the raw
//! capture, so nothing is cached here and an expansion can never diverge
//! from the file on disk.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use tracing::{debug, instrument, trace};

use crate::config::DisplayConfig;
use crate::error::{HarError, Result};
use crate::format::format_bytes;
use crate::model::{entry::query_of, Body, Entry, Har, NameValue};
use crate::util::parse_query;

/// One addressable section of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSection {
    /// `request.headers`
    RequestHeaders,
    /// `request.query`
    RequestQuery,
    /// `request.cookies`
    RequestCookies,
    /// `request.body`
    RequestBody,
    /// `response.headers`
    ResponseHeaders,
    /// `response.cookies`
    ResponseCookies,
    /// `response.body`
    ResponseBody,
    /// `entry.raw`: the whole entry as pretty JSON.
    EntryRaw,
}

impl ContentSection {
    /// Sections shown by a structured detail view, in display order.
    pub const DETAIL: [Self; 7] = [
        Self::RequestHeaders,
        Self::RequestQuery,
        Self::RequestCookies,
        Self::RequestBody,
        Self::ResponseHeaders,
        Self::ResponseCookies,
        Self::ResponseBody,
    ];

    /// Dotted path used in ref ids.
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::RequestHeaders => "request.headers",
            Self::RequestQuery => "request.query",
            Self::RequestCookies => "request.cookies",
            Self::RequestBody => "request.body",
            Self::ResponseHeaders => "response.headers",
            Self::ResponseCookies => "response.cookies",
            Self::ResponseBody => "response.body",
            Self::EntryRaw => "entry.raw",
        }
    }

    /// Parse a dotted section path, case-insensitively.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim().to_ascii_lowercase();
        let section = match path.as_str() {
            "request.headers" => Self::RequestHeaders,
            "request.query" | "request.querystring" => Self::RequestQuery,
            "request.cookies" => Self::RequestCookies,
            "request.body" | "request.postdata" => Self::RequestBody,
            "response.headers" => Self::ResponseHeaders,
            "response.cookies" => Self::ResponseCookies,
            "response.body" | "response.content" => Self::ResponseBody,
            "entry.raw" => Self::EntryRaw,
            _ => return None,
        };
        Some(section)
    }

    /// Heading used in detail views.
    pub const fn title(self) -> &'static str {
        match self {
            Self::RequestHeaders => "Request headers",
            Self::RequestQuery => "Query parameters",
            Self::RequestCookies => "Request cookies",
            Self::RequestBody => "Request body",
            Self::ResponseHeaders => "Response headers",
            Self::ResponseCookies => "Response cookies",
            Self::ResponseBody => "Response body",
            Self::EntryRaw => "Raw entry",
        }
    }

    /// Recompute this section's content from a raw entry.
    ///
    /// Returns `None` when the section is empty.
    pub fn render(self, entry: &Entry) -> Option<Rendered> {
        let rendered = match self {
            Self::RequestHeaders => Rendered::Text(name_value_lines(&entry.request.headers)?),
            Self::RequestQuery => {
                if entry.request.query_string.is_empty() {
                    let pairs = parse_query(query_of(&entry.request.url)?);
                    let lines: Vec<String> =
                        pairs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    Rendered::Text(non_empty(lines.join("\n"))?)
                } else {
                    Rendered::Text(name_value_lines(&entry.request.query_string)?)
                }
            }
            Self::RequestCookies => Rendered::Text(name_value_lines(&entry.request.cookies)?),
            Self::RequestBody => Rendered::from_body(entry.request.post_data.as_ref()?.body())?,
            Self::ResponseHeaders => Rendered::Text(name_value_lines(&entry.response.headers)?),
            Self::ResponseCookies => Rendered::Text(name_value_lines(&entry.response.cookies)?),
            Self::ResponseBody => Rendered::from_body(entry.response.content.body())?,
            Self::EntryRaw => Rendered::Text(serde_json::to_string_pretty(entry).ok()?),
        };
        Some(rendered)
    }
}

impl fmt::Display for ContentSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl Serialize for ContentSection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_path())
    }
}

impl FromStr for ContentSection {
    type Err = HarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_path(s).ok_or_else(|| {
            HarError::invalid_argument(
                "section",
                s,
                "expected one of request.headers, request.query, request.cookies, \
                 request.body, response.headers, response.cookies, response.body",
            )
        })
    }
}

/// Rendered section content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Text that may be previewed behind a ref.
    Text(String),
    /// Placeholder standing in for binary content; never put behind a ref.
    Binary(String),
}

impl Rendered {
    fn from_body(body: Body) -> Option<Self> {
        match body {
            Body::Empty => None,
            Body::Text(text) => Some(Self::Text(text)),
            Body::Binary { mime_type, size } => Some(Self::Binary(binary_placeholder(
                &mime_type, size,
            ))),
        }
    }

    /// The text, whichever kind it is.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Binary(text) => text,
        }
    }
}

/// Placeholder shown instead of binary content.
pub fn binary_placeholder(mime_type: &str, size: u64) -> String {
    let mime = if mime_type.is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };
    format!("[binary content: {mime}, {}]", format_bytes(size))
}

fn name_value_lines(pairs: &[NameValue]) -> Option<String> {
    let lines: Vec<String> = pairs
        .iter()
        .map(|p| format!("{}: {}", p.name, p.value))
        .collect();
    non_empty(lines.join("\n"))
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Address of one section of one entry: `e<index>.<side>.<section>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId {
    /// Entry index.
    pub entry_index: usize,
    /// Section within the entry.
    pub section: ContentSection,
}

impl RefId {
    /// Create a ref id.
    pub const fn new(entry_index: usize, section: ContentSection) -> Self {
        Self {
            entry_index,
            section,
        }
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}.{}", self.entry_index, self.section)
    }
}

impl FromStr for RefId {
    type Err = HarError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || HarError::InvalidRef {
            value: s.to_string(),
        };
        let trimmed = s.trim();
        let rest = trimmed
            .strip_prefix('e')
            .or_else(|| trimmed.strip_prefix('E'))
            .ok_or_else(invalid)?;
        let (index, path) = rest.split_once('.').ok_or_else(invalid)?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let entry_index = index.parse().map_err(|_| invalid())?;
        let section = ContentSection::from_path(path).ok_or_else(invalid)?;
        Ok(Self::new(entry_index, section))
    }
}

/// A handed-out ref. Holds no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefEntry {
    /// The ref id string.
    pub ref_id: String,
    /// Entry the ref points into.
    pub entry_index: usize,
    /// Section within the entry.
    pub section: ContentSection,
}

/// Registry of refs issued for the active session.
#[derive(Debug)]
pub struct RefStore {
    /// Session the registered refs belong to.
    session_id: RwLock<Option<String>>,
    /// Issued refs in issue order.
    refs: RwLock<IndexMap<String, RefEntry>>,
    /// Content at or above this many characters is previewed.
    preview_threshold: usize,
    /// Characters kept in a preview.
    preview_length: usize,
}

impl RefStore {
    /// Create a store with explicit sizing.
    pub fn new(preview_threshold: usize, preview_length: usize) -> Self {
        Self {
            session_id: RwLock::new(None),
            refs: RwLock::new(IndexMap::new()),
            preview_threshold,
            preview_length: preview_length.max(1),
        }
    }

    /// Create a store sized from display configuration.
    pub fn from_config(display: &DisplayConfig) -> Self {
        Self::new(display.preview_threshold, display.preview_length)
    }

    /// Associate the store with a session, forgetting refs from any other.
    pub fn bind(&self, session_id: &str) {
        let mut current = self.session_id.write();
        if current.as_deref() != Some(session_id) {
            let dropped = {
                let mut refs = self.refs.write();
                let n = refs.len();
                refs.clear();
                n
            };
            debug!(session = session_id, dropped, "Ref store bound to session");
            *current = Some(session_id.to_string());
        }
    }

    /// Forget every issued ref.
    pub fn clear(&self) {
        self.refs.write().clear();
        *self.session_id.write() = None;
    }

    /// Return `content` verbatim, or a preview plus the ref to expand it.
    ///
    /// Content is verbatim when `full` is set or when it is shorter than the
    /// preview threshold. Presenting the same content under the same ref
    /// always yields identical text.
    pub fn present(&self, content: &str, ref_id: &RefId, full: bool) -> String {
        let total = content.chars().count();
        if full || total < self.preview_threshold {
            return content.to_string();
        }

        self.register(ref_id);

        let preview: String = content.chars().take(self.preview_length).collect();
        format!(
            "{preview}\n... [truncated: showing {} of {total} chars. Full content: expand {ref_id}]",
            self.preview_length.min(total)
        )
    }

    /// Present rendered section content; binary placeholders bypass refs.
    pub fn present_rendered(&self, rendered: Rendered, ref_id: &RefId, full: bool) -> String {
        match rendered {
            Rendered::Text(text) => self.present(&text, ref_id, full),
            Rendered::Binary(placeholder) => placeholder,
        }
    }

    fn register(&self, ref_id: &RefId) {
        let key = ref_id.to_string();
        let mut refs = self.refs.write();
        if !refs.contains_key(&key) {
            trace!(ref_id = %key, "Registered ref");
            refs.insert(
                key.clone(),
                RefEntry {
                    ref_id: key,
                    entry_index: ref_id.entry_index,
                    section: ref_id.section,
                },
            );
        }
    }

    /// Recompute the full content behind a ref id.
    ///
    /// Returns `None` for malformed ids, out-of-range indices and empty
    /// sections.
    #[instrument(skip(self, har), level = "debug")]
    pub fn expand(&self, ref_id: &str, har: &Har) -> Option<String> {
        let id: RefId = ref_id.parse().ok()?;
        let entry = har.entry(id.entry_index)?;
        id.section.render(entry).map(Rendered::into_text)
    }

    /// Number of refs issued so far.
    pub fn len(&self) -> usize {
        self.refs.read().len()
    }

    /// Whether no refs have been issued.
    pub fn is_empty(&self) -> bool {
        self.refs.read().is_empty()
    }
}

impl Default for RefStore {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}
