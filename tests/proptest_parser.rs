//! Property-based tests for the capture parser and argument grammars.
//!
//! Uses proptest to fuzz the parser with generated inputs to ensure it
//! reports malformed captures instead of panicking, and checks that the
//! small textual grammars (status filters, ref ids, entry labels) agree
//! with their own rendering.

use harscope::format::truncate_middle;
use harscope::parser::{build_index, CaptureParser};
use harscope::protocol::EntryArg;
use harscope::query::StatusFilter;
use harscope::refs::{ContentSection, RefId};
use harscope::util::{mask_secret, redact_url_query};
use harscope::HarError;
use proptest::prelude::*;
use std::path::Path;

mod generators;

fn origin() -> &'static Path {
    Path::new("fuzz.har")
}

fn section() -> impl Strategy<Value = ContentSection> {
    prop::sample::select(
        ContentSection::DETAIL
            .iter()
            .copied()
            .chain(std::iter::once(ContentSection::EntryRaw))
            .collect::<Vec<_>>(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Parser should never panic on arbitrary byte input.
    #[test]
    fn parser_never_panics_on_arbitrary_bytes(
        bytes in prop::collection::vec(any::<u8>(), 0..10000)
    ) {
        let _ = CaptureParser::new().parse_slice(&bytes, origin());
    }

    /// Any rejection is a format error naming the file.
    #[test]
    fn parser_rejects_garbage_as_format_error(content in "[^{}\\[\\]\"]*") {
        let err = CaptureParser::new().parse_str(&content, origin()).unwrap_err();
        prop_assert!(matches!(err, HarError::Format { .. }), "{:?}", err);
        prop_assert!(err.to_string().contains("fuzz.har"));
    }

    /// Parser should handle deeply nested JSON without stack overflow.
    #[test]
    fn handles_deep_nesting(depth in 1usize..100) {
        let json = format!("{}\"value\"{}", "{\"log\":".repeat(depth), "}".repeat(depth));
        let _ = CaptureParser::new().parse_str(&json, origin());
    }

    /// The index always has one record per entry, in order.
    #[test]
    fn index_matches_entry_count(n in 0usize..60) {
        let json = generators::synthetic(n).build();
        let har = CaptureParser::new().parse_str(&json, origin()).unwrap();
        let index = build_index(&har);

        prop_assert_eq!(index.len(), n);
        for (i, entry) in index.iter().enumerate() {
            prop_assert_eq!(entry.index, i);
            prop_assert_eq!(entry.is_error, entry.status == 0 || entry.status >= 400);
        }
    }

    /// Status filters render back to the text they were parsed from.
    #[test]
    fn status_filter_display_round_trips(code in 0u16..1000, bucket in 1u16..6) {
        let exact: StatusFilter = code.to_string().parse().unwrap();
        prop_assert_eq!(exact, StatusFilter::Exact(code));
        prop_assert_eq!(exact.to_string().parse::<StatusFilter>().unwrap(), exact);

        let text = format!("{bucket}xx");
        let filter: StatusFilter = text.parse().unwrap();
        prop_assert_eq!(filter.to_string(), text);
    }

    /// A bucket matches exactly its hundred-wide range.
    #[test]
    fn status_bucket_bounds(bucket in 1u16..6, status in 0u16..1000) {
        let filter = StatusFilter::Bucket(bucket);
        let expected = (bucket * 100..=bucket * 100 + 99).contains(&status);
        prop_assert_eq!(filter.matches(status), expected);
    }

    /// Ref ids parse back to themselves.
    #[test]
    fn ref_id_round_trips(index in 0usize..100_000, section in section()) {
        let id = RefId::new(index, section);
        let parsed: RefId = id.to_string().parse().unwrap();
        prop_assert_eq!(parsed, id);
    }

    /// Strings outside the ref grammar are rejected as invalid refs.
    #[test]
    fn ref_id_rejects_other_text(text in "[a-df-z0-9 ]{0,20}") {
        let parsed = text.parse::<RefId>();
        prop_assert!(
            matches!(parsed, Err(HarError::InvalidRef { .. })),
            "expected InvalidRef for {:?}",
            text
        );
    }

    /// Entry labels resolve with or without the `e` prefix.
    #[test]
    fn entry_labels_resolve(index in 0usize..1_000_000) {
        prop_assert_eq!(EntryArg::Label(format!("e{index}")).index().unwrap(), index);
        prop_assert_eq!(EntryArg::Label(index.to_string()).index().unwrap(), index);
        prop_assert_eq!(EntryArg::Index(index).index().unwrap(), index);
    }

    /// Middle truncation never exceeds its budget.
    #[test]
    fn truncate_middle_respects_width(text in "\\PC{0,200}", max in 0usize..120) {
        let out = truncate_middle(&text, max);
        if text.chars().count() <= max {
            prop_assert_eq!(out, text);
        } else {
            prop_assert_eq!(out.chars().count(), max);
        }
    }

    /// Masked secrets never reveal more than a short prefix.
    #[test]
    fn masked_secrets_hide_the_tail(secret in "[A-Za-z0-9_-]{7,64}") {
        let masked = mask_secret(&secret);
        prop_assert!(masked.ends_with("..."));
        prop_assert!(!masked.contains(&secret));
        prop_assert_eq!(masked.chars().count(), 9);
    }

    /// Secret query parameters never survive URL redaction.
    #[test]
    fn url_redaction_removes_token_values(value in "[A-Za-z0-9]{8,40}") {
        let url = format!("https://a.com/cb?state=x&access_token={value}&page=2");
        let redacted = redact_url_query(&url);
        prop_assert!(!redacted.contains(&value));
        prop_assert!(redacted.contains("page=2"));
    }
}

/// Tests for specific edge cases discovered through fuzzing.
mod edge_cases {
    use super::*;

    #[test]
    fn byte_order_mark_is_ignored() {
        let json = format!("\u{FEFF}{}", generators::synthetic(2).build());
        let har = CaptureParser::new().parse_str(&json, origin()).unwrap();
        assert_eq!(har.entries().len(), 2);
    }

    #[test]
    fn whitespace_only_is_empty() {
        let err = CaptureParser::new()
            .parse_str("\t\r\n ", origin())
            .unwrap_err();
        assert!(err.to_string().contains("file is empty"));
    }

    #[test]
    fn status_filter_rejects_near_misses() {
        for text in ["4x", "xx", "6xx", "0xx", "1000", "-1", "four"] {
            assert!(text.parse::<StatusFilter>().is_err(), "{text} should be rejected");
        }
    }

    #[test]
    fn entry_label_rejects_words() {
        assert!(EntryArg::Label("entry".into()).index().is_err());
        assert!(EntryArg::Label("e".into()).index().is_err());
    }
}
