//! Error types for harscope.
//!
//! Errors fall into a handful of classes that callers treat differently:
//! malformed captures are fatal, a missing or stale session is guidance for
//! the caller, unresolved entries and refs are ordinary results, and bad
//! arguments echo the offending value back.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for harscope operations.
#[derive(Error, Debug)]
pub enum HarError {
    /// Capture file is missing, unparsable, or has the wrong shape.
    #[error("Invalid capture file {path}: {reason}")]
    Format {
        /// Path to the offending capture file.
        path: PathBuf,
        /// Reason the file was rejected.
        reason: String,
    },

    /// An operation other than load was called before any capture was loaded.
    #[error("No capture loaded. Run `load <file.har>` first.")]
    NoSession,

    /// The capture behind the session changed on disk since it was loaded.
    #[error("Capture file {path} changed since it was loaded. Run `load` again to re-index it.")]
    StaleSession {
        /// Path to the changed capture file.
        path: PathBuf,
    },

    /// Named session descriptor does not exist.
    #[error("Session not found: {name}")]
    SessionNotFound {
        /// Descriptor name that was requested.
        name: String,
    },

    /// Entry index out of range.
    #[error("Entry e{index} not found.")]
    EntryNotFound {
        /// Requested entry index.
        index: usize,
    },

    /// Ref id is well formed but resolves to nothing.
    #[error("No content found for ref {ref_id}")]
    RefNotFound {
        /// The ref id that did not resolve.
        ref_id: String,
    },

    /// Ref id does not follow `e<index>.<side>.<section>`.
    #[error("Invalid ref format: {value}")]
    InvalidRef {
        /// The malformed ref id.
        value: String,
    },

    /// Unknown analysis type.
    #[error("Unknown analysis type: {value}. Expected one of: errors, security, slow")]
    UnknownAnalysis {
        /// The rejected analysis type.
        value: String,
    },

    /// Invalid argument.
    #[error("Invalid argument '{name}': {value} ({reason})")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// The value that was rejected.
        value: String,
        /// Reason why the argument is invalid.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    Io {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    Serialization {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Tool server transport failure.
    #[error("MCP server error: {message}")]
    Server {
        /// Human-readable error message.
        message: String,
    },

    /// Unsupported operation or feature.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },
}

impl HarError {
    /// Create a new format error naming the offending file.
    #[must_use]
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a new invalid argument error.
    #[must_use]
    pub fn invalid_argument(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Format { .. } => exit_codes::EXIT_FORMAT_ERROR,
            Self::EntryNotFound { .. }
            | Self::RefNotFound { .. }
            | Self::SessionNotFound { .. } => exit_codes::EXIT_NOT_FOUND,
            Self::NoSession | Self::StaleSession { .. } => exit_codes::EXIT_NO_SESSION,
            Self::InvalidConfig { .. } => exit_codes::EXIT_CONFIG_ERROR,
            Self::InvalidRef { .. }
            | Self::UnknownAnalysis { .. }
            | Self::InvalidArgument { .. } => exit_codes::EXIT_USAGE_ERROR,
            Self::Io { .. } => exit_codes::EXIT_IO_ERROR,
            _ => exit_codes::EXIT_GENERAL_ERROR,
        }
    }

    /// Whether this error describes caller state rather than a fault.
    ///
    /// These are reported as plain guidance text and never logged as errors.
    #[must_use]
    pub const fn is_guidance(&self) -> bool {
        matches!(
            self,
            Self::NoSession
                | Self::StaleSession { .. }
                | Self::EntryNotFound { .. }
                | Self::RefNotFound { .. }
        )
    }
}

/// Result type alias for harscope operations.
pub type Result<T> = std::result::Result<T, HarError>;

impl From<std::io::Error> for HarError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for HarError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// Capture file could not be parsed.
    pub const EXIT_FORMAT_ERROR: i32 = 2;
    /// Entry, ref or session not found.
    pub const EXIT_NOT_FOUND: i32 = 3;
    /// No session loaded, or the loaded one went stale.
    pub const EXIT_NO_SESSION: i32 = 4;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Invalid command-line usage (BSD standard).
    pub const EXIT_USAGE_ERROR: i32 = 64;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(HarError::format("/x.har", "bad").exit_code(), 2);
        assert_eq!(HarError::EntryNotFound { index: 3 }.exit_code(), 3);
        assert_eq!(HarError::NoSession.exit_code(), 4);
        assert_eq!(
            HarError::InvalidRef {
                value: "bogus".into()
            }
            .exit_code(),
            64
        );
    }

    #[test]
    fn test_messages_echo_values() {
        let err = HarError::InvalidRef {
            value: "bogus".into(),
        };
        assert_eq!(err.to_string(), "Invalid ref format: bogus");

        let err = HarError::UnknownAnalysis {
            value: "perf".into(),
        };
        assert!(err.to_string().contains("perf"));

        let err = HarError::format("/tmp/cap.har", "missing log.entries");
        assert!(err.to_string().contains("/tmp/cap.har"));
    }

    #[test]
    fn test_is_guidance() {
        assert!(HarError::NoSession.is_guidance());
        assert!(!HarError::format("/x", "y").is_guidance());
    }
}
