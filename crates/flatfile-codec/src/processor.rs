//! Batch processing over files, text and line sequences.
//!
//! Every entry point funnels into the same per-line pipeline. Each run
//! returns its own [`ProcessOutcome`], so a processor holds no mutable state
//! and can be shared between threads.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use flatfile_model::{DEFAULT_NEWLINE, ProcessorOptions};

use crate::description::FlatRecord;
use crate::error::{EncodeError, FlatFileError, LineError, LineErrorKind, Result, SchemaError};
use crate::schema::{Schema, default_builder};

const UTF8_BOM: char = '\u{feff}';

/// A line that failed to decode during a run whose options allowed skipping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLine {
    /// 1-based physical line number.
    pub line_number: usize,
    /// The offending line, verbatim.
    pub text: String,
    /// Why it failed.
    pub kind: LineErrorKind,
}

impl From<LineError> for ErrorLine {
    fn from(err: LineError) -> Self {
        Self {
            line_number: err.line_number,
            text: err.text,
            kind: err.kind,
        }
    }
}

impl std::fmt::Display for ErrorLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.kind)
    }
}

/// Result of one completed run.
#[derive(Debug, Clone)]
pub struct ProcessOutcome<R> {
    /// Decoded records, in input order.
    pub records: Vec<R>,
    /// Lines that failed and were skipped, in input order.
    pub errors: Vec<ErrorLine>,
    /// Physical lines seen, including blank and failed lines.
    pub lines_read: usize,
}

impl<R> Default for ProcessOutcome<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
            lines_read: 0,
        }
    }
}

impl<R> ProcessOutcome<R> {
    /// Returns true if no line failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Discard the error list and keep the records.
    #[must_use]
    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

/// Reads and writes fixed-width files of one record type.
pub struct FileProcessor<R> {
    schema: Arc<Schema<R>>,
    options: ProcessorOptions,
}

impl<R: FlatRecord> FileProcessor<R> {
    /// Create a processor with default options.
    ///
    /// Fails if the record type's description is invalid.
    pub fn new() -> std::result::Result<Self, SchemaError> {
        Self::with_options(ProcessorOptions::default())
    }

    /// Create a processor with the given options.
    pub fn with_options(options: ProcessorOptions) -> std::result::Result<Self, SchemaError> {
        let schema = default_builder().schema::<R>()?;
        Ok(Self::from_schema(schema, options))
    }
}

impl<R> FileProcessor<R> {
    /// Create a processor over an already built schema.
    #[must_use]
    pub fn from_schema(schema: Arc<Schema<R>>, options: ProcessorOptions) -> Self {
        Self { schema, options }
    }

    /// The record schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema<R>> {
        &self.schema
    }

    /// The processing options.
    #[must_use]
    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// Encode one record.
    pub fn encode_record(&self, record: &R) -> std::result::Result<String, EncodeError> {
        self.schema.encode(record)
    }

    /// Encode records, terminating every line with the configured newline.
    pub fn write_string<'a, I>(&self, records: I) -> std::result::Result<String, EncodeError>
    where
        I: IntoIterator<Item = &'a R>,
        R: 'a,
    {
        let newline = self.newline();
        let mut out = String::new();
        for record in records {
            out.push_str(&self.schema.encode(record)?);
            out.push_str(newline);
        }
        Ok(out)
    }

    /// Encode records into a writer. Returns the number of records written.
    pub fn write_to<'a, W, I>(&self, mut writer: W, records: I) -> Result<usize>
    where
        W: Write,
        I: IntoIterator<Item = &'a R>,
        R: 'a,
    {
        let newline = self.newline();
        let mut count = 0usize;
        for record in records {
            let line = self.schema.encode(record)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(newline.as_bytes())?;
            count += 1;
        }
        writer.flush()?;
        Ok(count)
    }

    /// Encode records into a file, replacing it.
    ///
    /// Every record is encoded before the file is touched, so an encode
    /// failure leaves any existing file in place.
    pub fn write_file<'a, I>(&self, path: &Path, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a R>,
        R: 'a,
    {
        let mut count = 0usize;
        let text = self.write_string(records.into_iter().inspect(|_| count += 1))?;
        fs::write(path, text).map_err(|e| FlatFileError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), records = count, "wrote flat file");
        Ok(count)
    }

    fn newline(&self) -> &str {
        if self.options.newline.is_empty() {
            DEFAULT_NEWLINE
        } else {
            &self.options.newline
        }
    }
}

impl<R: Default> FileProcessor<R> {
    /// Read and process a UTF-8 file.
    pub fn process_file(&self, path: &Path) -> Result<ProcessOutcome<R>> {
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FlatFileError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                FlatFileError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read flat file");
        self.process_bytes(bytes)
    }

    /// Read a UTF-8 source to the end and process it.
    pub fn process_reader(&self, mut reader: impl Read) -> Result<ProcessOutcome<R>> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.process_bytes(bytes)
    }

    /// Split text on the configured newline and process each line.
    ///
    /// A single trailing newline ends the last line rather than starting an
    /// empty one. Empty text has no lines. With the default `"\n"` newline a
    /// `\r` ending a line is dropped as well, so CRLF text reads the same.
    pub fn process_str(&self, text: &str) -> Result<ProcessOutcome<R>> {
        self.process_lines(split_lines(text, self.newline()))
    }

    /// Process a pre-split sequence of lines.
    pub fn process_lines<I, S>(&self, lines: I) -> Result<ProcessOutcome<R>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcome = ProcessOutcome::default();
        let mut skipped_empty = 0usize;

        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            let line_number = idx + 1;
            outcome.lines_read += 1;

            match self.schema.decode(line, line_number) {
                Ok(record) => outcome.records.push(record),
                Err(err) if self.options.skip_empty_lines && err.is_empty_line() => {
                    tracing::trace!(line = line_number, "skipping empty line");
                    skipped_empty += 1;
                    outcome.errors.push(err.into());
                }
                Err(err) if self.options.skip_line_on_failure => {
                    tracing::warn!(
                        record = self.schema.record_name(),
                        line = line_number,
                        kind = err.kind.code(),
                        "skipping line that failed to decode"
                    );
                    tracing::trace!(line = line_number, text = line, "skipped line");
                    outcome.errors.push(err.into());
                }
                Err(err) => {
                    tracing::debug!(
                        record = self.schema.record_name(),
                        line = line_number,
                        kind = err.kind.code(),
                        "aborting run on line failure"
                    );
                    return Err(err.into());
                }
            }
        }

        tracing::info!(
            record = self.schema.record_name(),
            lines = outcome.lines_read,
            records = outcome.records.len(),
            errors = outcome.errors.len(),
            skipped_empty,
            "processed flat file lines"
        );
        Ok(outcome)
    }

    /// Decode a single line.
    pub fn decode_line(&self, line: &str, line_number: usize) -> std::result::Result<R, LineError> {
        self.schema.decode(line, line_number)
    }

    fn process_bytes(&self, bytes: Vec<u8>) -> Result<ProcessOutcome<R>> {
        let text = String::from_utf8(bytes).map_err(|_| FlatFileError::InvalidEncoding)?;
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(&text);
        self.process_str(text)
    }
}

impl<R> Clone for FileProcessor<R> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            options: self.options.clone(),
        }
    }
}

impl<R> std::fmt::Debug for FileProcessor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileProcessor")
            .field("record", &self.schema.record_name())
            .field("options", &self.options)
            .finish()
    }
}

/// Split whole-text input into lines.
///
/// With a `"\n"` delimiter one trailing `\r` is stripped from every line.
fn split_lines<'a>(text: &'a str, newline: &'a str) -> impl Iterator<Item = &'a str> {
    let body = (!text.is_empty()).then(|| text.strip_suffix(newline).unwrap_or(text));
    let crlf = newline == "\n";
    body.into_iter()
        .flat_map(move |body| body.split(newline))
        .map(move |line| {
            if crlf {
                line.strip_suffix('\r').unwrap_or(line)
            } else {
                line
            }
        })
}
