//! harscope: token-budget-aware inspection of HTTP Archive (HAR) captures.
//!
//! A HAR file can run to hundreds of megabytes. harscope indexes it once,
//! persists the index as a small session descriptor, and answers questions
//! about it in compact text that fits a human terminal or an agent's
//! context window. Large content is never dumped: it is previewed and
//! addressed by a short ref id (`e14.response.body`) that can be expanded
//! on demand.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use harscope::config::Config;
//! use harscope::protocol::{DetailArgs, Inspector, ListArgs, LoadArgs};
//!
//! fn main() -> harscope::Result<()> {
//!     let inspector = Inspector::from_config(&Config::default())?;
//!
//!     println!("{}", inspector.try_load(&LoadArgs { file: "capture.har".into() })?);
//!
//!     let failures = ListArgs {
//!         status: Some(harscope::query::StatusArg::Pattern("5xx".into())),
//!         ..ListArgs::default()
//!     };
//!     println!("{}", inspector.try_list(&failures)?);
//!     println!("{}", inspector.try_detail(&DetailArgs::entry(0))?);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`parser`]: HAR parsing and indexing
//! - [`session`]: persisted session descriptors and staleness checks
//! - [`refs`]: previews and ref ids for large content
//! - [`query`]: entry filters and text search
//! - [`analysis`]: error, security and latency heuristics
//! - [`format`]: dashboards and entry lines
//! - [`export`]: filtered, optionally sanitized capture export
//! - [`protocol`]: the operation surface shared by the CLI and MCP server
//! - [`cli`]: command-line interface
//! - [`config`]: configuration management
//! - [`error`]: error types and handling

#![doc(html_root_url = "https://docs.rs/harscope/0.1.0")]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
#[cfg(feature = "mcp")]
pub mod mcp_server;
pub mod model;
pub mod parser;
pub mod protocol;
pub mod query;
pub mod refs;
pub mod session;
pub mod util;

// Re-export commonly used types at the crate root
pub use error::{HarError, Result};
pub use protocol::{Inspector, ToolResult};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
