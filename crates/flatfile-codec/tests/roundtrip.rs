//! Property tests for the line codec.

mod common;

use common::{Person, Shipment};
use flatfile_codec::{LineErrorKind, Schema};
use proptest::prelude::*;

fn date_text(sep: &'static str) -> impl Strategy<Value = String> {
    (1000u32..=9999, 1u32..=12, 1u32..=28)
        .prop_map(move |(y, m, d)| format!("{y:04}{sep}{m:02}{sep}{d:02}"))
}

fn person_line() -> impl Strategy<Value = String> {
    ("[0-9]{5}", "[A-Za-z .']{20}", date_text(""), "[0-9]{10}")
        .prop_map(|(id, name, date, salary)| format!("{id}{name}{date}{salary}"))
}

fn shipment_line() -> impl Strategy<Value = String> {
    ("[A-Z0-9 ]{6}", "[0-9]{4}", date_text("-"))
        .prop_map(|(carrier, weight, date)| format!("{carrier} {weight} {date}"))
}

proptest! {
    #[test]
    fn sequential_decode_then_encode_reproduces_line(line in person_line()) {
        let schema = Schema::<Person>::of().expect("schema");
        let person = schema.decode(&line, 1).expect("well-formed line decodes");
        prop_assert_eq!(schema.encode(&person).expect("encode"), line);
    }

    #[test]
    fn positional_decode_then_encode_reproduces_line(line in shipment_line()) {
        let schema = Schema::<Shipment>::of().expect("schema");
        let shipment = schema.decode(&line, 1).expect("well-formed line decodes");
        prop_assert_eq!(schema.encode(&shipment).expect("encode"), line);
    }

    #[test]
    fn decode_is_idempotent(line in person_line(), line_number in 1usize..10_000) {
        let schema = Schema::<Person>::of().expect("schema");
        let first = schema.decode(&line, line_number).expect("decode");
        let second = schema.decode(&line, line_number).expect("decode");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn wrong_length_lines_are_rejected(
        line in "[ -~]{1,80}".prop_filter("not 43 characters", |s| s.len() != 43),
        line_number in 1usize..10_000,
    ) {
        let schema = Schema::<Person>::of().expect("schema");
        let err = schema.decode(&line, line_number).unwrap_err();
        prop_assert_eq!(err.line_number, line_number);
        let is_mismatch = matches!(
            err.kind,
            LineErrorKind::LineLengthMismatch { expected: 43, .. }
        );
        prop_assert!(is_mismatch);
    }

    #[test]
    fn short_positional_lines_read_past_end(
        line in shipment_line(),
        cut in 0usize..22,
        line_number in 1usize..10_000,
    ) {
        let schema = Schema::<Shipment>::of().expect("schema");
        let short = &line[..cut.max(1)];
        let err = schema.decode(short, line_number).unwrap_err();
        prop_assert_eq!(err.line_number, line_number);
        let is_read_past = matches!(err.kind, LineErrorKind::ReadPastEndOfLine { .. });
        prop_assert!(is_read_past);
    }
}
