//! Capture file parsing and indexing.
//!
//! Parsing validates only the shape harscope relies on: a `log.entries`
//! array whose entries each carry a request, a response and some timing.
//! Any mismatch is a [`HarError::Format`] naming the file; a capture is
//! either accepted whole or rejected.
//!
//! # Example
//!
//! ```rust,no_run
//! use harscope::parser::{build_index, CaptureParser};
//!
//! let har = CaptureParser::new().parse_file("traffic.har")?;
//! let index = build_index(&har);
//! println!("Indexed {} entries", index.len());
//! # Ok::<(), harscope::HarError>(())
//! ```

use std::fs;
use std::path::Path;

use tracing::{debug, instrument, trace};

use crate::error::{HarError, Result};
use crate::format::format_bytes;
use crate::model::{Har, IndexedEntry};

/// Default maximum capture size (unlimited).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 0;

/// Parser for HAR capture files.
#[derive(Debug, Clone)]
pub struct CaptureParser {
    /// Maximum file size in bytes (0 = unlimited).
    max_file_size: u64,
}

impl CaptureParser {
    /// Create a new parser with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set maximum file size in bytes (0 = unlimited).
    #[must_use]
    pub fn with_max_file_size(mut self, max_bytes: u64) -> Self {
        self.max_file_size = max_bytes;
        self
    }

    /// Read a capture file into memory, enforcing the size limit.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();

        let metadata = fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HarError::format(path, "file does not exist")
            } else {
                HarError::io(format!("Failed to stat {}", path.display()), e)
            }
        })?;
        if !metadata.is_file() {
            return Err(HarError::format(path, "not a regular file"));
        }

        if self.max_file_size > 0 && metadata.len() > self.max_file_size {
            debug!(
                file_size = metadata.len(),
                max_size = self.max_file_size,
                "Capture exceeds size limit"
            );
            return Err(HarError::format(
                path,
                format!(
                    "file size ({}) exceeds maximum ({})",
                    format_bytes(metadata.len()),
                    format_bytes(self.max_file_size)
                ),
            ));
        }

        fs::read(path).map_err(|e| HarError::io(format!("Failed to read {}", path.display()), e))
    }

    /// Parse a capture file from a path.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Har> {
        let path = path.as_ref();
        let bytes = self.read_file(path)?;
        self.parse_slice(&bytes, path)
    }

    /// Parse capture bytes; `origin` names the file in errors.
    pub fn parse_slice(&self, bytes: &[u8], origin: &Path) -> Result<Har> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(HarError::format(origin, "file is empty"));
        }

        let har: Har = serde_json::from_slice(bytes)
            .map_err(|e| HarError::format(origin, format!("not a HAR document: {e}")))?;
        validate(&har, origin)?;

        debug!(entries = har.log.entries.len(), "Parsed capture");
        Ok(har)
    }

    /// Parse a capture from a string.
    pub fn parse_str(&self, content: &str, origin: &Path) -> Result<Har> {
        self.parse_slice(content.as_bytes(), origin)
    }
}

impl Default for CaptureParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a capture file with default settings.
pub fn parse(path: impl AsRef<Path>) -> Result<Har> {
    CaptureParser::new().parse_file(path)
}

/// Structural checks serde cannot express.
fn validate(har: &Har, origin: &Path) -> Result<()> {
    for (index, entry) in har.log.entries.iter().enumerate() {
        if entry.request.method.trim().is_empty() {
            return Err(HarError::format(
                origin,
                format!("entry {index} has an empty request method"),
            ));
        }
        if entry.request.url.trim().is_empty() {
            return Err(HarError::format(
                origin,
                format!("entry {index} has an empty request url"),
            ));
        }
        if !entry.has_timing() {
            return Err(HarError::format(
                origin,
                format!("entry {index} has no timing information"),
            ));
        }
    }
    Ok(())
}

/// Derive the index: one record per entry, in file order.
pub fn build_index(har: &Har) -> Vec<IndexedEntry> {
    let index: Vec<IndexedEntry> = har
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| IndexedEntry::from_entry(i, entry))
        .collect();
    trace!(count = index.len(), "Built entry index");
    index
}
