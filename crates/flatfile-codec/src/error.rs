//! Error types for schema building, line decoding and record encoding.
//!
//! There are two failure families:
//! - [`SchemaError`]: the record type is misconfigured. Raised once when the
//!   schema is built and never recovered from.
//! - [`LineError`]: a single line could not be decoded. Recoverable, subject
//!   to the batch processor's options.
//!
//! [`EncodeError`] covers the write path and [`FlatFileError`] wraps all of
//! them together with file I/O failures.

use std::path::PathBuf;

use flatfile_model::LineMode;
use thiserror::Error;

/// Structural misconfiguration of a record type.
///
/// Variants are listed in the order the schema builder checks them; the
/// builder stops at the first failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No line mode marker was declared.
    #[error("record type '{record}' is missing a line mode marker")]
    MissingModeMarker { record: String },

    /// More than one line mode marker was declared.
    #[error("record type '{record}' declares {count} line mode markers; exactly one is allowed")]
    DuplicateModeMarker { record: String, count: usize },

    /// The record type declares no fields.
    #[error("record type '{record}' does not declare any fields")]
    NoFieldsDeclared { record: String },

    /// A field layout belongs to the other line mode.
    #[error("record type '{record}' is {mode} but field '{field}' has a {field_mode} layout")]
    ModeFieldMismatch {
        record: String,
        field: String,
        mode: LineMode,
        field_mode: LineMode,
    },

    /// A field occupies zero characters.
    #[error("field '{field}' of record type '{record}' has zero length")]
    ZeroLengthField { record: String, field: String },

    /// Two fields share a name.
    #[error("record type '{record}' declares field '{field}' more than once")]
    DuplicateFieldName { record: String, field: String },

    /// Two sequential fields share an order value.
    #[error("fields '{first}' and '{second}' of record type '{record}' share order {order}")]
    DuplicateOrder {
        record: String,
        order: u32,
        first: String,
        second: String,
    },

    /// No conversion with this rule is registered for the field's value type.
    #[error(
        "field '{field}' of record type '{record}': no conversion '{rule}' is registered for type {type_name}"
    )]
    UnresolvedConversion {
        record: String,
        field: String,
        type_name: &'static str,
        rule: String,
    },

    /// The conversion exists but its parameters are unusable.
    #[error("field '{field}' of record type '{record}': invalid parameters for '{rule}': {reason}")]
    InvalidConversion {
        record: String,
        field: String,
        rule: String,
        reason: String,
    },
}

impl SchemaError {
    /// Name of the record type the error refers to.
    #[must_use]
    pub fn record(&self) -> &str {
        match self {
            Self::MissingModeMarker { record }
            | Self::DuplicateModeMarker { record, .. }
            | Self::NoFieldsDeclared { record }
            | Self::ModeFieldMismatch { record, .. }
            | Self::ZeroLengthField { record, .. }
            | Self::DuplicateFieldName { record, .. }
            | Self::DuplicateOrder { record, .. }
            | Self::UnresolvedConversion { record, .. }
            | Self::InvalidConversion { record, .. } => record,
        }
    }
}

/// Failure to decode a single line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: {kind}")]
pub struct LineError {
    /// 1-based position of the line in its source.
    pub line_number: usize,
    /// The offending line, verbatim.
    pub text: String,
    /// What went wrong.
    pub kind: LineErrorKind,
}

impl LineError {
    /// Create a line error.
    pub fn new(line_number: usize, text: impl Into<String>, kind: LineErrorKind) -> Self {
        Self {
            line_number,
            text: text.into(),
            kind,
        }
    }

    /// Whether the line failed because it was empty.
    #[must_use]
    pub fn is_empty_line(&self) -> bool {
        matches!(self.kind, LineErrorKind::EmptyLine)
    }
}

/// Classification of a [`LineError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineErrorKind {
    /// The line has no characters.
    #[error("line is empty")]
    EmptyLine,

    /// A sequential line is not exactly as long as its fields.
    #[error("line contains {actual} characters, expected {expected}")]
    LineLengthMismatch { expected: usize, actual: usize },

    /// A positional field extends beyond the end of the line.
    #[error(
        "field '{field}' (start {start}, length {length}) reads past the end of a {actual} character line"
    )]
    ReadPastEndOfLine {
        field: String,
        start: usize,
        length: usize,
        actual: usize,
    },

    /// The field's conversion rejected its text.
    #[error("conversion '{rule}' failed on field '{field}' with value '{value}': {reason}")]
    ConversionFailed {
        field: String,
        rule: String,
        value: String,
        reason: String,
    },
}

impl LineErrorKind {
    /// Short machine-readable code, used in log events.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyLine => "empty_line",
            Self::LineLengthMismatch { .. } => "line_length_mismatch",
            Self::ReadPastEndOfLine { .. } => "read_past_end_of_line",
            Self::ConversionFailed { .. } => "conversion_failed",
        }
    }
}

/// Failure to encode a record into a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The formatted value does not fit its field.
    #[error("field '{field}' value '{value}' is {actual} characters long, exceeding its length of {length}")]
    FieldTooLong {
        field: String,
        value: String,
        length: usize,
        actual: usize,
    },

    /// Positional fields overlap, so there is no unambiguous line to emit.
    #[error("fields '{first}' and '{second}' overlap and cannot be encoded")]
    OverlappingFields { first: String, second: String },

    /// The field's conversion could not format its value.
    #[error("conversion '{rule}' could not format field '{field}': {reason}")]
    FormatFailed {
        field: String,
        rule: String,
        reason: String,
    },
}

/// Errors from flat file processing.
#[derive(Debug, Error)]
pub enum FlatFileError {
    /// Record type misconfiguration.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A line failed and the options did not allow skipping it.
    #[error(transparent)]
    Line(#[from] LineError),

    /// A record could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read an input file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is not valid UTF-8.
    #[error("input is not valid UTF-8")]
    InvalidEncoding,

    /// I/O error on a caller-supplied reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for flat file operations.
pub type Result<T> = std::result::Result<T, FlatFileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::MissingModeMarker {
            record: "Person".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "record type 'Person' is missing a line mode marker"
        );
        assert_eq!(err.record(), "Person");

        let err = SchemaError::ModeFieldMismatch {
            record: "Person".to_string(),
            field: "id".to_string(),
            mode: LineMode::Sequential,
            field_mode: LineMode::Positional,
        };
        assert_eq!(
            err.to_string(),
            "record type 'Person' is sequential but field 'id' has a positional layout"
        );
    }

    #[test]
    fn test_line_error_display() {
        let err = LineError::new(
            7,
            "0001",
            LineErrorKind::LineLengthMismatch {
                expected: 44,
                actual: 4,
            },
        );
        assert_eq!(
            err.to_string(),
            "line 7: line contains 4 characters, expected 44"
        );
        assert!(!err.is_empty_line());
        assert_eq!(err.kind.code(), "line_length_mismatch");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "test");
        let err: FlatFileError = io_err.into();
        assert!(matches!(err, FlatFileError::Io(_)));
    }

    #[test]
    fn test_line_error_conversion() {
        let err: FlatFileError = LineError::new(1, "", LineErrorKind::EmptyLine).into();
        assert_eq!(err.to_string(), "line 1: line is empty");
    }
}
