//! Aggregate statistics over an entry index.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::IndexedEntry;

/// Summary counts shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStats {
    /// Number of entries.
    pub total_entries: usize,
    /// Entries flagged as errors.
    pub error_count: usize,
    /// Sum of response body sizes in bytes.
    pub total_size: u64,
    /// Sum of entry times in milliseconds.
    pub total_time_ms: f64,
    /// Counts per status bucket (`0`, `1xx` .. `5xx`), in bucket order.
    pub status_buckets: IndexMap<String, usize>,
    /// Counts per domain, most frequent first.
    pub domains: IndexMap<String, usize>,
    /// Counts per method, most frequent first.
    pub methods: IndexMap<String, usize>,
}

impl CaptureStats {
    /// Compute stats in one pass over the index.
    pub fn from_entries(entries: &[IndexedEntry]) -> Self {
        let mut stats = Self {
            total_entries: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            if entry.is_error {
                stats.error_count += 1;
            }
            stats.total_size = stats.total_size.saturating_add(entry.response_size);
            stats.total_time_ms += entry.time_ms;

            *stats
                .status_buckets
                .entry(status_bucket(entry.status))
                .or_default() += 1;
            *stats.domains.entry(entry.domain.clone()).or_default() += 1;
            *stats.methods.entry(entry.method.clone()).or_default() += 1;
        }

        stats.status_buckets.sort_keys();
        sort_by_count(&mut stats.domains);
        sort_by_count(&mut stats.methods);
        stats
    }
}

/// Bucket label for a status code: `0` for network failures, else `Nxx`.
pub fn status_bucket(status: u16) -> String {
    if status == 0 {
        "0".to_string()
    } else {
        format!("{}xx", status / 100)
    }
}

fn sort_by_count(map: &mut IndexMap<String, usize>) {
    map.sort_by(|ka, va, kb, vb| vb.cmp(va).then_with(|| ka.cmp(kb)));
}
