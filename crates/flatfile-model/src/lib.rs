//! Data model for fixed-width flat file records.
//!
//! This crate holds the plain data that describes a flat file layout:
//!
//! - [`LineMode`]: whole-line (sequential) or positional-slice processing
//! - [`FieldLayout`]: where a field sits inside a line
//! - [`ValueKind`]: the semantic kind of a field's value
//! - [`Conversion`]: the named rule (plus parameters) that turns text into a value
//! - [`ProcessorOptions`]: batch processing configuration
//!
//! It has no behavior beyond construction and small accessors; the codec
//! lives in `flatfile-codec`.

mod conversion;
mod layout;
mod options;

pub use conversion::{Conversion, PARSE, PARSE_EXACT, SCALED};
pub use layout::{FieldLayout, LineMode, ValueKind};
pub use options::{DEFAULT_NEWLINE, ProcessorOptions};
