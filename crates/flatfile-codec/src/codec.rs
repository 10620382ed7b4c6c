//! Line codec: one line to one record and back.
//!
//! Offsets and lengths count characters, not bytes. ASCII lines are sliced
//! directly; other lines go through a character index built once per line.

use flatfile_model::LineMode;

use crate::error::{EncodeError, LineError, LineErrorKind};
use crate::schema::{FieldDescriptor, Schema};

/// Decode one line into a fresh record.
///
/// `line_number` is only used for error reporting.
pub fn decode<R: Default>(
    schema: &Schema<R>,
    line: &str,
    line_number: usize,
) -> Result<R, LineError> {
    if line.is_empty() {
        return Err(LineError::new(line_number, line, LineErrorKind::EmptyLine));
    }

    let chars = CharIndex::new(line);
    let actual = chars.len();

    if schema.mode() == LineMode::Sequential && actual != schema.line_width() {
        return Err(LineError::new(
            line_number,
            line,
            LineErrorKind::LineLengthMismatch {
                expected: schema.line_width(),
                actual,
            },
        ));
    }

    let mut record = R::default();
    for field in schema.fields() {
        if field.end() > actual {
            return Err(LineError::new(
                line_number,
                line,
                LineErrorKind::ReadPastEndOfLine {
                    field: field.name().to_string(),
                    start: field.offset(),
                    length: field.length(),
                    actual,
                },
            ));
        }

        let value = chars.slice(line, field.offset(), field.end());
        field.decode_into(&mut record, value).map_err(|source| {
            LineError::new(
                line_number,
                line,
                LineErrorKind::ConversionFailed {
                    field: field.name().to_string(),
                    rule: field.conversion().rule.clone(),
                    value: value.to_string(),
                    reason: source.to_string(),
                },
            )
        })?;
    }

    Ok(record)
}

/// Encode a record into one line.
///
/// Fields are written in physical order. Gaps between positional fields are
/// filled with spaces.
pub fn encode<R>(schema: &Schema<R>, record: &R) -> Result<String, EncodeError> {
    if let Some((first, second)) = schema.overlapping_fields() {
        return Err(EncodeError::OverlappingFields {
            first: first.name().to_string(),
            second: second.name().to_string(),
        });
    }

    let mut line = String::with_capacity(schema.line_width());
    let mut cursor = 0usize;
    for field in schema.physical_fields() {
        let text = field
            .encode_from(record)
            .map_err(|source| EncodeError::FormatFailed {
                field: field.name().to_string(),
                rule: field.conversion().rule.clone(),
                reason: source.to_string(),
            })?;

        line.extend(std::iter::repeat_n(' ', field.offset() - cursor));
        pad_into(&mut line, field, &text)?;
        cursor = field.end();
    }

    Ok(line)
}

/// Append `text` padded to the field's length.
///
/// Numeric kinds are zero-filled on the left, after any sign; everything
/// else is space-filled on the right.
fn pad_into<R>(
    line: &mut String,
    field: &FieldDescriptor<R>,
    text: &str,
) -> Result<(), EncodeError> {
    let actual = text.chars().count();
    let length = field.length();
    if actual > length {
        return Err(EncodeError::FieldTooLong {
            field: field.name().to_string(),
            value: text.to_string(),
            length,
            actual,
        });
    }

    let fill = std::iter::repeat_n(field.kind().pad_char(), length - actual);
    if field.kind().is_numeric() {
        let (sign, digits) = match text.strip_prefix(['-', '+']) {
            Some(rest) => text.split_at(text.len() - rest.len()),
            None => ("", text),
        };
        line.push_str(sign);
        line.extend(fill);
        line.push_str(digits);
    } else {
        line.push_str(text);
        line.extend(fill);
    }
    Ok(())
}

/// Character offsets of a line.
enum CharIndex {
    Ascii(usize),
    /// Byte offset of every char, plus the line length in bytes.
    Unicode(Vec<usize>),
}

impl CharIndex {
    fn new(line: &str) -> Self {
        if line.is_ascii() {
            Self::Ascii(line.len())
        } else {
            let mut offsets: Vec<usize> = line.char_indices().map(|(idx, _)| idx).collect();
            offsets.push(line.len());
            Self::Unicode(offsets)
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Ascii(len) => *len,
            Self::Unicode(offsets) => offsets.len() - 1,
        }
    }

    /// Characters `[start, end)`. Callers check `end <= len()`.
    fn slice<'a>(&self, line: &'a str, start: usize, end: usize) -> &'a str {
        match self {
            Self::Ascii(_) => &line[start..end],
            Self::Unicode(offsets) => &line[offsets[start]..offsets[end]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::RecordDescription;
    use crate::schema::SchemaBuilder;
    use flatfile_model::{Conversion, FieldLayout};
    use rust_decimal::Decimal;

    #[derive(Debug, Default, PartialEq)]
    struct Entry {
        code: String,
        qty: i32,
        price: Decimal,
    }

    fn sequential() -> Schema<Entry> {
        let desc = RecordDescription::<Entry>::new("Entry")
            .mode(LineMode::Sequential)
            .field("code", FieldLayout::sequential(1, 4), |e| &e.code, |e| &mut e.code)
            .field("qty", FieldLayout::sequential(2, 3), |e| &e.qty, |e| &mut e.qty)
            .field_with(
                "price",
                FieldLayout::sequential(3, 6),
                Conversion::scaled(2),
                |e| &e.price,
                |e| &mut e.price,
            );
        SchemaBuilder::new().build(desc).unwrap()
    }

    fn positional() -> Schema<Entry> {
        let desc = RecordDescription::<Entry>::new("Entry")
            .mode(LineMode::Positional)
            .field("qty", FieldLayout::positional(8, 3), |e| &e.qty, |e| &mut e.qty)
            .field("code", FieldLayout::positional(2, 4), |e| &e.code, |e| &mut e.code);
        SchemaBuilder::new().build(desc).unwrap()
    }

    #[test]
    fn test_decode_sequential() {
        let entry = decode(&sequential(), "AB  012001999", 1).unwrap();
        assert_eq!(entry.code, "AB  ");
        assert_eq!(entry.qty, 12);
        assert_eq!(entry.price, Decimal::new(1999, 2));
    }

    #[test]
    fn test_decode_empty_line() {
        let err = decode(&sequential(), "", 4).unwrap_err();
        assert_eq!(err.line_number, 4);
        assert!(err.is_empty_line());
    }

    #[test]
    fn test_decode_length_mismatch() {
        let err = decode(&sequential(), "AB  01200199", 2).unwrap_err();
        assert_eq!(
            err.kind,
            LineErrorKind::LineLengthMismatch {
                expected: 13,
                actual: 12
            }
        );
    }

    #[test]
    fn test_decode_conversion_failure_names_field() {
        let err = decode(&sequential(), "AB  0x2001999", 3).unwrap_err();
        match err.kind {
            LineErrorKind::ConversionFailed { field, rule, value, .. } => {
                assert_eq!(field, "qty");
                assert_eq!(rule, "parse");
                assert_eq!(value, "0x2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.text, "AB  0x2001999");
    }

    #[test]
    fn test_decode_positional_ignores_unmapped_text() {
        let entry = decode(&positional(), "..WXYZ..042 trailing", 1).unwrap();
        assert_eq!(entry.code, "WXYZ");
        assert_eq!(entry.qty, 42);
    }

    #[test]
    fn test_decode_positional_read_past_end() {
        let err = decode(&positional(), "..WXYZ..04", 7).unwrap_err();
        assert_eq!(err.line_number, 7);
        assert_eq!(
            err.kind,
            LineErrorKind::ReadPastEndOfLine {
                field: "qty".to_string(),
                start: 8,
                length: 3,
                actual: 10,
            }
        );
    }

    #[test]
    fn test_decode_counts_characters() {
        let entry = decode(&sequential(), "Zoë 012001999", 1).unwrap();
        assert_eq!(entry.code, "Zoë ");
        assert_eq!(entry.qty, 12);
    }

    #[test]
    fn test_encode_sequential_padding() {
        let entry = Entry {
            code: "AB".to_string(),
            qty: 7,
            price: Decimal::new(525, 2),
        };
        assert_eq!(encode(&sequential(), &entry).unwrap(), "AB  007000525");
    }

    #[test]
    fn test_encode_negative_is_sign_aware() {
        let entry = Entry {
            code: "X".to_string(),
            qty: -5,
            price: Decimal::new(-150, 2),
        };
        let line = encode(&sequential(), &entry).unwrap();
        assert_eq!(line, "X   -05-00150");

        // Text keeps its padding on the way back.
        let decoded = decode(&sequential(), &line, 1).unwrap();
        assert_eq!(
            decoded,
            Entry {
                code: "X   ".to_string(),
                ..entry
            }
        );
        assert_eq!(encode(&sequential(), &decoded).unwrap(), line);
    }

    #[test]
    fn test_encode_scaled_float_with_extra_places_fails() {
        #[derive(Debug, Default)]
        struct Reading {
            value: f64,
        }

        let desc = RecordDescription::<Reading>::new("Reading")
            .mode(LineMode::Sequential)
            .field_with(
                "value",
                FieldLayout::sequential(1, 6),
                Conversion::scaled(2),
                |r| &r.value,
                |r| &mut r.value,
            );
        let schema = SchemaBuilder::new().build(desc).unwrap();

        let ok = Reading { value: 1.5 };
        assert_eq!(encode(&schema, &ok).unwrap(), "000150");

        let err = encode(&schema, &Reading { value: 1.2345 }).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::FormatFailed { ref field, ref rule, .. } if field == "value" && rule == "scaled"
        ));
    }

    #[test]
    fn test_encode_positional_fills_gaps() {
        let entry = Entry {
            code: "WXYZ".to_string(),
            qty: 42,
            ..Entry::default()
        };
        assert_eq!(encode(&positional(), &entry).unwrap(), "  WXYZ  042");
    }

    #[test]
    fn test_encode_field_too_long() {
        let entry = Entry {
            code: "TOOLONG".to_string(),
            ..Entry::default()
        };
        let err = encode(&sequential(), &entry).unwrap_err();
        assert_eq!(
            err,
            EncodeError::FieldTooLong {
                field: "code".to_string(),
                value: "TOOLONG".to_string(),
                length: 4,
                actual: 7,
            }
        );
    }

    #[test]
    fn test_encode_rejects_overlap() {
        let desc = RecordDescription::<Entry>::new("Entry")
            .mode(LineMode::Positional)
            .field("code", FieldLayout::positional(0, 4), |e| &e.code, |e| &mut e.code)
            .field("qty", FieldLayout::positional(3, 3), |e| &e.qty, |e| &mut e.qty);
        let schema = SchemaBuilder::new().build(desc).unwrap();

        // Decoding an overlapping layout is still allowed.
        let entry = decode(&schema, "ABC123", 1).unwrap();
        assert_eq!(entry.code, "ABC1");
        assert_eq!(entry.qty, 123);

        let err = encode(&schema, &entry).unwrap_err();
        assert!(matches!(err, EncodeError::OverlappingFields { .. }));
    }
}
