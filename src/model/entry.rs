//! Lightweight per-entry index records.

use serde::{Deserialize, Serialize};

use super::har::Entry;

/// Derived metadata for one captured entry.
///
/// Built once when a capture is loaded and persisted in the session
/// descriptor; `index` is the only address used by filters, detail lookups
/// and refs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedEntry {
    /// 0-based position in the capture file.
    pub index: usize,
    /// Upper-cased HTTP method.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Lower-cased host, without port or credentials.
    pub domain: String,
    /// URL path without query string or fragment.
    pub path: String,
    /// Response status, 0 for network-level failures.
    pub status: u16,
    /// Response body size in bytes.
    pub response_size: u64,
    /// Total elapsed time in milliseconds.
    pub time_ms: f64,
    /// Status 0 or >= 400.
    pub is_error: bool,
    /// Response MIME type without parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Request start time as recorded in the capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
}

impl IndexedEntry {
    /// Derive the index record for the entry at `index`.
    pub fn from_entry(index: usize, entry: &Entry) -> Self {
        let (domain, path) = split_url(&entry.request.url);
        let status = u16::try_from(entry.response.status.max(0)).unwrap_or(u16::MAX);
        let mime_type = entry
            .response
            .content
            .mime_type
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| entry.response.header("content-type"))
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_string())
            .filter(|m| !m.is_empty());

        Self {
            index,
            method: entry.request.method.to_ascii_uppercase(),
            url: entry.request.url.clone(),
            domain,
            path,
            status,
            response_size: entry.response.size(),
            time_ms: entry.elapsed_ms(),
            is_error: is_error_status(status),
            mime_type,
            started: entry.started_date_time.clone(),
        }
    }

    /// The `e<index>` label used in every rendering of this entry.
    pub fn label(&self) -> String {
        format!("e{}", self.index)
    }
}

/// Network failures (status 0) and 4xx/5xx responses are errors.
pub const fn is_error_status(status: u16) -> bool {
    status == 0 || status >= 400
}

/// Split a URL into its host and path.
///
/// The host is lower-cased with userinfo and port removed; the path drops
/// the query string and fragment and defaults to `/`. Strings without a
/// scheme have an empty host and are treated as a bare path.
pub fn split_url(url: &str) -> (String, String) {
    let Some(rest) = after_scheme(url) else {
        let path = url.split(['?', '#']).next().unwrap_or("");
        let path = if path.is_empty() { "/" } else { path };
        return (String::new(), path.to_string());
    };

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = if let Some(stripped) = host_port.strip_prefix('[') {
        // IPv6 literal: keep brackets, drop port
        stripped
            .split(']')
            .next()
            .map_or_else(|| host_port.to_string(), |h| format!("[{h}]"))
    } else {
        host_port.split(':').next().unwrap_or(host_port).to_string()
    };

    let remainder = &rest[authority_end..];
    let path = remainder.split(['?', '#']).next().unwrap_or("");
    let path = if path.is_empty() { "/" } else { path };

    (host.to_ascii_lowercase(), path.to_string())
}

/// The part after `scheme://`, when the separator precedes any path, query
/// or fragment delimiter.
fn after_scheme(url: &str) -> Option<&str> {
    let sep = url.find("://")?;
    let first_delim = url.find(['/', '?', '#']).unwrap_or(url.len());
    (sep < first_delim && sep > 0).then(|| &url[sep + 3..])
}

/// Extract the raw query string of a URL, if any.
pub fn query_of(url: &str) -> Option<&str> {
    let after = url.split_once('?')?.1;
    let query = after.split('#').next().unwrap_or(after);
    (!query.is_empty()).then_some(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url_basic() {
        let (domain, path) = split_url("https://API.Example.com/v1/users?id=3#top");
        assert_eq!(domain, "api.example.com");
        assert_eq!(path, "/v1/users");
    }

    #[test]
    fn test_split_url_port_and_userinfo() {
        let (domain, path) = split_url("http://user:pw@localhost:8080");
        assert_eq!(domain, "localhost");
        assert_eq!(path, "/");
    }

    #[test]
    fn test_split_url_ipv6() {
        let (domain, path) = split_url("http://[::1]:3000/health");
        assert_eq!(domain, "[::1]");
        assert_eq!(path, "/health");
    }

    #[test]
    fn test_split_url_without_scheme() {
        let (domain, path) = split_url("/relative?x=1");
        assert_eq!(domain, "");
        assert_eq!(path, "/relative");
    }

    #[test]
    fn test_split_url_scheme_inside_query() {
        let (domain, path) = split_url("/r?to=http://x.com/y");
        assert_eq!(domain, "");
        assert_eq!(path, "/r");

        let (domain, path) = split_url("/go#http://x.com");
        assert_eq!(domain, "");
        assert_eq!(path, "/go");
    }

    #[test]
    fn test_label_and_mime_from_header() {
        let entry: Entry = serde_json::from_str(
            r#"{"request":{"method":"get","url":"https://a.com/x"},
                "response":{"status":200,"headers":[
                    {"name":"Content-Type","value":"application/json; charset=utf-8"}
                ]}}"#,
        )
        .unwrap();
        let indexed = IndexedEntry::from_entry(4, &entry);
        assert_eq!(indexed.label(), "e4");
        assert_eq!(indexed.method, "GET");
        assert_eq!(indexed.mime_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_query_of() {
        assert_eq!(query_of("https://a.com/x?k=v&z=1#f"), Some("k=v&z=1"));
        assert_eq!(query_of("https://a.com/x"), None);
        assert_eq!(query_of("https://a.com/x?"), None);
    }

    #[test]
    fn test_is_error_status() {
        assert!(is_error_status(0));
        assert!(is_error_status(400));
        assert!(is_error_status(503));
        assert!(!is_error_status(200));
        assert!(!is_error_status(399));
    }
}
