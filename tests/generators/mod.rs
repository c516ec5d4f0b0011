//! Synthetic HAR capture generators.
//!
//! Builds capture documents entry by entry so each test states exactly the
//! traffic it depends on.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Builder for a HAR 1.2 capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuilder {
    entries: Vec<Value>,
}

impl CaptureBuilder {
    /// Start an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry with no headers and no body.
    pub fn entry(mut self, method: &str, url: &str, status: i64) -> Self {
        let index = self.entries.len();
        self.entries.push(json!({
            "startedDateTime": format!("2024-05-01T10:00:{:02}.000Z", index % 60),
            "time": 10.0,
            "request": {
                "method": method,
                "url": url,
                "httpVersion": "HTTP/1.1",
                "headers": [],
                "queryString": [],
                "cookies": [],
                "headersSize": -1,
                "bodySize": 0
            },
            "response": {
                "status": status,
                "statusText": "",
                "httpVersion": "HTTP/1.1",
                "headers": [],
                "cookies": [],
                "content": { "size": 0, "mimeType": "text/plain" },
                "redirectURL": "",
                "headersSize": -1,
                "bodySize": 0
            },
            "cache": {},
            "timings": { "send": 1.0, "wait": 8.0, "receive": 1.0 }
        }));
        self
    }

    /// Shorthand for a GET entry.
    pub fn get(self, url: &str, status: i64) -> Self {
        self.entry("GET", url, status)
    }

    fn last(&mut self) -> &mut Value {
        self.entries
            .last_mut()
            .expect("add an entry before configuring it")
    }

    /// Set the last entry's response body.
    pub fn response_body(mut self, mime_type: &str, text: &str) -> Self {
        let size = text.len();
        self.last()["response"]["content"] = json!({
            "size": size,
            "mimeType": mime_type,
            "text": text
        });
        self
    }

    /// Set the last entry's base64-encoded response body.
    pub fn response_base64(mut self, mime_type: &str, encoded: &str, size: usize) -> Self {
        self.last()["response"]["content"] = json!({
            "size": size,
            "mimeType": mime_type,
            "text": encoded,
            "encoding": "base64"
        });
        self
    }

    /// Set the last entry's request body.
    pub fn request_body(mut self, mime_type: &str, text: &str) -> Self {
        self.last()["request"]["postData"] = json!({ "mimeType": mime_type, "text": text });
        self
    }

    /// Add a request header to the last entry.
    pub fn request_header(mut self, name: &str, value: &str) -> Self {
        push(&mut self.last()["request"]["headers"], name, value);
        self
    }

    /// Add a response header to the last entry.
    pub fn response_header(mut self, name: &str, value: &str) -> Self {
        push(&mut self.last()["response"]["headers"], name, value);
        self
    }

    /// Add a request cookie to the last entry.
    pub fn request_cookie(mut self, name: &str, value: &str) -> Self {
        push(&mut self.last()["request"]["cookies"], name, value);
        self
    }

    /// Set the last entry's elapsed time.
    pub fn time(mut self, ms: f64) -> Self {
        self.last()["time"] = json!(ms);
        self
    }

    /// Number of entries so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The capture as a JSON value.
    pub fn to_value(&self) -> Value {
        json!({
            "log": {
                "version": "1.2",
                "creator": { "name": "harscope-tests", "version": "1.0" },
                "pages": [],
                "entries": self.entries
            }
        })
    }

    /// The capture as pretty-printed JSON.
    pub fn build(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).expect("capture serializes")
    }

    /// Write the capture into `dir` and return its path.
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).expect("write capture");
        path
    }
}

fn push(list: &mut Value, name: &str, value: &str) {
    if let Some(items) = list.as_array_mut() {
        items.push(json!({ "name": name, "value": value }));
    }
}

/// A capture of `n` GET requests cycling through a few domains and statuses.
pub fn synthetic(n: usize) -> CaptureBuilder {
    const DOMAINS: [&str; 3] = ["api.example.com", "cdn.example.com", "auth.example.org"];
    const STATUSES: [i64; 5] = [200, 200, 304, 404, 500];

    (0..n).fold(CaptureBuilder::new(), |builder, i| {
        builder
            .get(
                &format!("https://{}/items/{i}", DOMAINS[i % DOMAINS.len()]),
                STATUSES[i % STATUSES.len()],
            )
            .response_body("application/json", &format!("{{\"id\":{i}}}"))
            .time((i % 7) as f64 * 150.0)
    })
}
