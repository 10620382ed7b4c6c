//! Schema-driven fixed-width flat file decoding and encoding.
//!
//! A record type describes its layout once, through [`FlatRecord`]. The
//! [`SchemaBuilder`] validates that description and resolves each field's
//! conversion into a [`Schema`]; the line codec then turns lines into records
//! and records into lines, and [`FileProcessor`] runs it over whole files.
//!
//! # Features
//!
//! - Sequential (whole-line) and positional (slice) layouts
//! - Typed conversion registry, resolved when the schema is built
//! - Exact-format dates (`yyyyMMdd` style or `strftime` patterns)
//! - Scaled decimals with implied decimal places
//! - Per-run error collection with skip policies for bad and blank lines
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use flatfile_codec::{
//!     Conversion, FieldLayout, FileProcessor, FlatRecord, LineMode, RecordDescription,
//! };
//! use rust_decimal::Decimal;
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     id: i32,
//!     name: String,
//!     birth_date: NaiveDate,
//!     salary: Decimal,
//! }
//!
//! impl FlatRecord for Person {
//!     fn describe() -> RecordDescription<Self> {
//!         RecordDescription::<Self>::new("Person")
//!             .mode(LineMode::Sequential)
//!             .field("id", FieldLayout::sequential(1, 5), |p| &p.id, |p| &mut p.id)
//!             .field("name", FieldLayout::sequential(6, 20), |p| &p.name, |p| &mut p.name)
//!             .field_with(
//!                 "birth_date",
//!                 FieldLayout::sequential(26, 8),
//!                 Conversion::exact("yyyyMMdd"),
//!                 |p| &p.birth_date,
//!                 |p| &mut p.birth_date,
//!             )
//!             .field_with(
//!                 "salary",
//!                 FieldLayout::sequential(34, 10),
//!                 Conversion::scaled(2),
//!                 |p| &p.salary,
//!                 |p| &mut p.salary,
//!             )
//!     }
//! }
//!
//! let processor = FileProcessor::<Person>::new().unwrap();
//! let outcome = processor
//!     .process_str("00001John Doe            202101010000012345\n")
//!     .unwrap();
//!
//! let person = &outcome.records[0];
//! assert_eq!(person.id, 1);
//! assert_eq!(person.salary, Decimal::new(12345, 2));
//! assert_eq!(
//!     processor.encode_record(person).unwrap(),
//!     "00001John Doe            202101010000012345"
//! );
//! ```
//!
//! # Logging
//!
//! The crate emits `tracing` events and never installs a subscriber. Raw
//! line text is only logged at `trace` level.

mod codec;
pub mod convert;
mod description;
mod error;
mod processor;
mod schema;

// Re-export error types
pub use error::{EncodeError, FlatFileError, LineError, LineErrorKind, Result, SchemaError};

// Re-export the layout model
pub use flatfile_model::{
    Conversion, DEFAULT_NEWLINE, FieldLayout, LineMode, PARSE, PARSE_EXACT, ProcessorOptions,
    SCALED, ValueKind,
};

// Re-export the record description and schema
pub use convert::{ConversionRegistry, FieldConverter, FieldType};
pub use description::{FieldSpec, FlatRecord, RecordDescription};
pub use schema::{FieldDescriptor, Schema, SchemaBuilder, default_builder};

// Re-export the line codec and batch processor
pub use codec::{decode, encode};
pub use processor::{ErrorLine, FileProcessor, ProcessOutcome};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
