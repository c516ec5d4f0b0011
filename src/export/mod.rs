//! Export planning and filtered capture output.
//!
//! Planning is pure: it decides which entries an export would contain and
//! summarizes that decision. Producing the filtered document is a separate
//! step ([`render`]), and writing it to disk is left to the caller
//! ([`write_har`]) so the tool protocol never touches the file system.

use std::fmt::Write as _;
use std::path::Path;

use tracing::{info, instrument};

use crate::error::{HarError, Result};
use crate::format::format_bytes;
use crate::model::{Har, Log, NameValue};
use crate::query::{filter, EntryFilter, StatusFilter};
use crate::session::Session;
use crate::util::{
    atomic_write, is_secret_param_name, is_sensitive_header, redact_text, redact_url_query,
    REDACTED,
};

/// What to export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOptions {
    /// Domain filter.
    pub domain: Option<String>,
    /// Status filter.
    pub status: Option<StatusFilter>,
    /// Replace credentials with placeholders.
    pub sanitize: bool,
    /// Drop request and response bodies.
    pub strip_bodies: bool,
}

/// The decided contents of an export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    /// Indices of exported entries, in file order.
    pub indices: Vec<usize>,
    /// Entries in the session.
    pub total_entries: usize,
    /// Sum of exported response sizes.
    pub bytes: u64,
    /// Options the plan was made with.
    pub options: ExportOptions,
}

impl ExportPlan {
    /// Decide which entries of `session` an export contains.
    pub fn new(session: &Session, options: ExportOptions) -> Result<Self> {
        let criteria = EntryFilter {
            domain: options.domain.clone(),
            status: options.status,
            ..EntryFilter::default()
        };
        let selected = filter(&session.entries, &criteria)?;

        Ok(Self {
            indices: selected.iter().map(|e| e.index).collect(),
            total_entries: session.entries.len(),
            bytes: selected.iter().map(|e| e.response_size).sum(),
            options,
        })
    }

    /// Number of exported entries.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the export would be empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Human-readable summary of the plan.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Export plan: {} of {} entries ({})",
            self.len(),
            self.total_entries,
            format_bytes(self.bytes)
        );

        let mut filters = Vec::new();
        if let Some(domain) = &self.options.domain {
            filters.push(format!("domain={domain}"));
        }
        if let Some(status) = self.options.status {
            filters.push(format!("status={status}"));
        }
        let _ = write!(
            out,
            "\nFilters: {}",
            if filters.is_empty() {
                "none".to_string()
            } else {
                filters.join(", ")
            }
        );
        let _ = write!(
            out,
            "\nSanitize: {} | Strip bodies: {}",
            yes_no(self.options.sanitize),
            yes_no(self.options.strip_bodies)
        );
        out
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Build the exported document from the raw capture.
pub fn render(plan: &ExportPlan, har: &Har) -> Har {
    let entries = plan
        .indices
        .iter()
        .filter_map(|&i| har.entry(i))
        .cloned()
        .map(|mut entry| {
            if plan.options.strip_bodies {
                if let Some(post) = entry.request.post_data.as_mut() {
                    post.text = None;
                    post.params.clear();
                }
                entry.response.content.text = None;
                entry.response.content.encoding = None;
            }
            if plan.options.sanitize {
                entry.request.url = redact_url_query(&entry.request.url);
                sanitize_headers(&mut entry.request.headers);
                sanitize_values(&mut entry.request.cookies);
                for param in &mut entry.request.query_string {
                    if is_secret_param_name(&param.name) {
                        param.value = REDACTED.to_string();
                    }
                }
                if let Some(post) = entry.request.post_data.as_mut() {
                    if let Some(text) = post.text.as_mut() {
                        *text = redact_text(text).into_owned();
                    }
                    for param in &mut post.params {
                        if is_secret_param_name(&param.name) {
                            param.value = REDACTED.to_string();
                        }
                    }
                }
                sanitize_headers(&mut entry.response.headers);
                sanitize_values(&mut entry.response.cookies);
                let content = &mut entry.response.content;
                if content.encoding.is_none() {
                    if let Some(text) = content.text.as_mut() {
                        *text = redact_text(text).into_owned();
                    }
                }
            }
            entry
        })
        .collect();

    Har {
        log: Log {
            version: har.log.version.clone(),
            creator: har.log.creator.clone(),
            entries,
            extra: har.log.extra.clone(),
        },
    }
}

fn sanitize_headers(headers: &mut [NameValue]) {
    for header in headers {
        if is_sensitive_header(&header.name) {
            header.value = REDACTED.to_string();
        } else {
            header.value = redact_text(&header.value).into_owned();
        }
    }
}

fn sanitize_values(pairs: &mut [NameValue]) {
    for pair in pairs {
        pair.value = REDACTED.to_string();
    }
}

/// Write a capture document atomically.
#[instrument(
    skip(path, har),
    fields(path = %path.display(), entries = har.entries().len())
)]
pub fn write_har(path: &Path, har: &Har) -> Result<()> {
    let json = serde_json::to_vec_pretty(har).map_err(|e| HarError::Serialization {
        context: "Failed to serialize exported capture".to_string(),
        source: e,
    })?;
    atomic_write(path, &json)?;
    info!("Export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CaptureParser;
    use std::path::PathBuf;

    const CAPTURE: &str = r#"{"log":{"version":"1.2","entries":[
        {"time":1,"request":{"method":"GET","url":"https://a.com/x?token=abc123&page=1",
            "headers":[{"name":"Authorization","value":"Bearer abc.def.ghi"},{"name":"Accept","value":"*/*"}],
            "queryString":[{"name":"token","value":"abc123"},{"name":"page","value":"1"}],
            "cookies":[{"name":"sid","value":"s3cr3t"}]},
         "response":{"status":200,"content":{"size":5,"text":"hello"}}},
        {"time":1,"request":{"method":"POST","url":"https://b.com/y",
            "postData":{"mimeType":"application/json","text":"{\"password\": \"hunter22\"}"}},
         "response":{"status":404,"content":{"size":9,"text":"not found"}}}
    ]}}"#;

    fn session() -> (Session, Har) {
        let har = CaptureParser::new()
            .parse_str(CAPTURE, &PathBuf::from("t.har"))
            .unwrap();
        let session = Session::from_capture(PathBuf::from("t.har"), "00".repeat(32), &har);
        (session, har)
    }

    #[test]
    fn test_plan_summary() {
        let (session, _) = session();
        let plan = ExportPlan::new(
            &session,
            ExportOptions {
                status: Some("4xx".parse().unwrap()),
                sanitize: true,
                ..ExportOptions::default()
            },
        )
        .unwrap();

        assert_eq!(plan.indices, vec![1]);
        assert_eq!(
            plan.summary(),
            "Export plan: 1 of 2 entries (9 B)\nFilters: status=4xx\nSanitize: yes | Strip bodies: no"
        );
    }

    #[test]
    fn test_render_sanitized() {
        let (session, har) = session();
        let options = ExportOptions {
            sanitize: true,
            ..ExportOptions::default()
        };
        let plan = ExportPlan::new(&session, options).unwrap();
        let out = render(&plan, &har);
        let json = serde_json::to_string(&out).unwrap();

        assert_eq!(out.entries().len(), 2);
        assert!(!json.contains("abc.def.ghi"));
        assert!(!json.contains("abc123"));
        assert!(!json.contains("s3cr3t"));
        assert!(!json.contains("hunter22"));
        assert!(json.contains("page=1"));
        assert!(json.contains("hello"));
        assert_eq!(out.log.version.as_deref(), Some("1.2"));
    }

    #[test]
    fn test_render_strip_bodies() {
        let (session, har) = session();
        let plan = ExportPlan::new(
            &session,
            ExportOptions {
                strip_bodies: true,
                ..ExportOptions::default()
            },
        )
        .unwrap();
        let out = render(&plan, &har);
        assert!(out.entries().iter().all(|e| e.response.content.text.is_none()));
        assert!(out.entries()[1].request.post_data.as_ref().unwrap().text.is_none());
    }

    #[test]
    fn test_write_har() {
        let (session, har) = session();
        let plan = ExportPlan::new(&session, ExportOptions::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.har");

        write_har(&path, &render(&plan, &har)).unwrap();

        let reparsed = crate::parser::parse(&path).unwrap();
        assert_eq!(reparsed.entries().len(), 2);
    }
}
