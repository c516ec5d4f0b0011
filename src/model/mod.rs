//! Data model for HTTP Archive captures.
//!
//! Two layers live here:
//! - [`har`]: the raw capture document as written by browsers and proxies
//! - [`entry`]: the lightweight per-entry index derived from it
//!
//! Raw types keep unknown fields so that re-serialized entries (raw detail
//! output, exports) lose nothing the capturing tool wrote.

pub mod entry;
pub mod har;

pub use entry::*;
pub use har::*;

use indexmap::IndexMap;
use serde_json::Value;

/// Fields not modelled explicitly, kept in file order.
pub type UnknownFields = IndexMap<String, Value>;
