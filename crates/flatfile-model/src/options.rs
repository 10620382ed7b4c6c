//! Configuration options for batch processing.

use serde::{Deserialize, Serialize};

/// Default line delimiter for whole-text input.
pub const DEFAULT_NEWLINE: &str = "\n";

/// Options controlling how a batch run splits input and handles failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorOptions {
    /// Split point for whole-text and file input (default: `"\n"`).
    pub newline: String,

    /// Keep going when a line fails to decode. The failure is still recorded
    /// in the run's error list.
    pub skip_line_on_failure: bool,

    /// Keep going past blank lines. Each one is still recorded in the run's
    /// error list as an `EmptyLine` failure.
    pub skip_empty_lines: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            newline: DEFAULT_NEWLINE.to_string(),
            skip_line_on_failure: false,
            skip_empty_lines: false,
        }
    }
}

impl ProcessorOptions {
    /// Create options with defaults (strict: every failure aborts the run).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that tolerate both failed and blank lines.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            skip_line_on_failure: true,
            skip_empty_lines: true,
            ..Self::default()
        }
    }

    /// Set the line delimiter.
    #[must_use]
    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }

    /// Continue past lines that fail to decode.
    #[must_use]
    pub fn skip_line_on_failure(mut self) -> Self {
        self.skip_line_on_failure = true;
        self
    }

    /// Record blank lines as failures and keep going.
    #[must_use]
    pub fn skip_empty_lines(mut self) -> Self {
        self.skip_empty_lines = true;
        self
    }
}
