//! Raw HAR document types.
//!
//! Only the fields harscope reads are typed; everything else is carried in
//! `extra` so a round-trip preserves it.

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::UnknownFields;

/// A parsed capture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Har {
    /// The `log` object wrapping everything else.
    pub log: Log,
}

impl Har {
    /// Captured entries in file order.
    pub fn entries(&self) -> &[Entry] {
        &self.log.entries
    }

    /// Get an entry by its 0-based index.
    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.log.entries.get(index)
    }
}

/// The HAR `log` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// HAR format version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Tool that produced the capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<Creator>,
    /// Captured request/response pairs.
    pub entries: Vec<Entry>,
    /// Unmodelled fields (pages, browser, comment...).
    #[serde(flatten)]
    pub extra: UnknownFields,
}

/// Name and version of the capturing tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creator {
    /// Tool name.
    #[serde(default)]
    pub name: String,
    /// Tool version.
    #[serde(default)]
    pub version: String,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: UnknownFields,
}

/// One captured request/response exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// ISO 8601 start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_date_time: Option<String>,
    /// Total elapsed time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// The request.
    pub request: Request,
    /// The response.
    pub response: Response,
    /// Phase timings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timings: Option<Timings>,
    /// Unmodelled fields (cache, serverIPAddress, connection...).
    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl Entry {
    /// Elapsed time in milliseconds.
    ///
    /// Falls back to the sum of the non-negative phase timings when the
    /// capture omits the `time` field.
    pub fn elapsed_ms(&self) -> f64 {
        match (self.time, &self.timings) {
            (Some(time), _) if time >= 0.0 => time,
            (_, Some(timings)) => timings.total(),
            _ => 0.0,
        }
    }

    /// Whether the entry carries any timing information at all.
    pub fn has_timing(&self) -> bool {
        self.time.is_some() || self.timings.is_some()
    }
}

/// A name/value pair: header, query parameter or cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameValue {
    /// Field name.
    pub name: String,
    /// Field value.
    #[serde(default)]
    pub value: String,
    /// Unmodelled fields (cookie path, expiry...).
    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl NameValue {
    /// Create a bare name/value pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            extra: UnknownFields::new(),
        }
    }
}

/// The HTTP request half of an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// HTTP method.
    pub method: String,
    /// Absolute request URL.
    pub url: String,
    /// Protocol version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_version: Option<String>,
    /// Request headers in wire order.
    #[serde(default)]
    pub headers: Vec<NameValue>,
    /// Parsed query string.
    #[serde(default)]
    pub query_string: Vec<NameValue>,
    /// Request cookies.
    #[serde(default)]
    pub cookies: Vec<NameValue>,
    /// Posted body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<PostData>,
    /// Unmodelled fields (headersSize, bodySize...).
    #[serde(flatten)]
    pub extra: UnknownFields,
}

/// Posted request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    /// Body MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Form parameters, for url-encoded and multipart bodies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<NameValue>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: UnknownFields,
}

/// The HTTP response half of an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Status code; 0 (or negative) for network-level failures.
    pub status: i32,
    /// Reason phrase.
    #[serde(default)]
    pub status_text: String,
    /// Protocol version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_version: Option<String>,
    /// Response headers in wire order.
    #[serde(default)]
    pub headers: Vec<NameValue>,
    /// Response cookies.
    #[serde(default)]
    pub cookies: Vec<NameValue>,
    /// Response body.
    #[serde(default)]
    pub content: Content,
    /// Redirect target from the Location header.
    #[serde(rename = "redirectURL", default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Transferred body size, -1 when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_size: Option<i64>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl Response {
    /// Get the first header with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Best known size of the response body in bytes.
    pub fn size(&self) -> u64 {
        if self.content.size >= 0 {
            return self.content.size as u64;
        }
        if let Some(size) = self.body_size.filter(|s| *s >= 0) {
            return size as u64;
        }
        self.content.text.as_ref().map_or(0, |t| t.len() as u64)
    }
}

/// Response body description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Decoded body size in bytes, -1 when unknown.
    #[serde(default = "unknown_size")]
    pub size: i64,
    /// Body MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Body text, possibly base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Encoding of `text`, usually `base64` or absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl Default for Content {
    fn default() -> Self {
        Self {
            size: unknown_size(),
            mime_type: None,
            text: None,
            encoding: None,
            extra: UnknownFields::new(),
        }
    }
}

fn unknown_size() -> i64 {
    -1
}

/// Body content as harscope presents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// No body was captured.
    Empty,
    /// Textual body.
    Text(String),
    /// Binary body; only described, never returned.
    Binary {
        /// Declared MIME type.
        mime_type: String,
        /// Size in bytes.
        size: u64,
    },
}

impl Body {
    /// Classify a captured body.
    ///
    /// Base64 payloads are decoded when they turn out to be UTF-8 text of a
    /// textual MIME type.
    pub fn classify(text: Option<&str>, encoding: Option<&str>, mime_type: Option<&str>) -> Self {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return Self::Empty;
        };
        let mime = mime_type.unwrap_or("").to_string();
        let base64_encoded = encoding.is_some_and(|e| e.eq_ignore_ascii_case("base64"));

        if !base64_encoded {
            return Self::Text(text.to_string());
        }

        let decoded = base64::engine::general_purpose::STANDARD.decode(text.trim());
        match decoded {
            Ok(bytes) if is_textual_mime(&mime) => match String::from_utf8(bytes) {
                Ok(text) => Self::Text(text),
                Err(e) => Self::Binary {
                    mime_type: mime,
                    size: e.into_bytes().len() as u64,
                },
            },
            Ok(bytes) => Self::Binary {
                mime_type: mime,
                size: bytes.len() as u64,
            },
            Err(_) => Self::Binary {
                mime_type: mime,
                size: text.len() as u64,
            },
        }
    }

    /// Text of the body, if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Content {
    /// Classified response body.
    pub fn body(&self) -> Body {
        Body::classify(
            self.text.as_deref(),
            self.encoding.as_deref(),
            self.mime_type.as_deref(),
        )
    }
}

impl PostData {
    /// Classified request body.
    ///
    /// Form bodies captured only as `params` are rendered as `name=value`
    /// lines.
    pub fn body(&self) -> Body {
        match Body::classify(self.text.as_deref(), None, self.mime_type.as_deref()) {
            Body::Empty if !self.params.is_empty() => Body::Text(
                self.params
                    .iter()
                    .map(|p| format!("{}={}", p.name, p.value))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            body => body,
        }
    }
}

/// Whether a MIME type denotes text that is safe to show.
pub fn is_textual_mime(mime: &str) -> bool {
    let mime = mime.to_ascii_lowercase();
    mime.is_empty()
        || mime.starts_with("text/")
        || mime.contains("json")
        || mime.contains("xml")
        || mime.contains("javascript")
        || mime.contains("x-www-form-urlencoded")
        || mime.contains("graphql")
        || mime.contains("svg")
}

/// Phase timings in milliseconds; -1 marks a phase that does not apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timings {
    /// Time spent queued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked: Option<f64>,
    /// DNS resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<f64>,
    /// TCP connect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect: Option<f64>,
    /// Sending the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send: Option<f64>,
    /// Waiting for the first byte.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<f64>,
    /// Receiving the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive: Option<f64>,
    /// TLS handshake, already included in `connect`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<f64>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl Timings {
    /// Sum of the applicable phases. `ssl` is part of `connect`.
    pub fn total(&self) -> f64 {
        [
            self.blocked,
            self.dns,
            self.connect,
            self.send,
            self.wait,
            self.receive,
        ]
        .iter()
        .flatten()
        .filter(|v| **v > 0.0)
        .sum()
    }
}

fn find_header<'a>(headers: &'a [NameValue], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}
