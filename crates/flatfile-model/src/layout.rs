//! Line modes, field layouts and value kinds.

use serde::{Deserialize, Serialize};

/// How a record type slices its lines.
///
/// | Mode         | Field placement                              | Line length        |
/// |--------------|----------------------------------------------|--------------------|
/// | `Sequential` | next `length` characters after prior fields  | exactly the sum    |
/// | `Positional` | explicit `(start, length)` offset            | at least the reach |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineMode {
    /// Fields are contiguous and ordered by their declared rank.
    Sequential,
    /// Fields are read from explicit offsets, independent of each other.
    Positional,
}

impl std::fmt::Display for LineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Positional => write!(f, "positional"),
        }
    }
}

/// Placement of one field inside a line.
///
/// Offsets and lengths count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldLayout {
    /// Whole-line mode: the field occupies the next `length` characters, and
    /// `order` ranks it among the other fields of the record.
    Sequential { order: u32, length: usize },
    /// Slice mode: the field occupies `[start, start + length)`.
    Positional { start: usize, length: usize },
}

impl FieldLayout {
    /// Create a sequential layout.
    #[must_use]
    pub const fn sequential(order: u32, length: usize) -> Self {
        Self::Sequential { order, length }
    }

    /// Create a positional layout.
    #[must_use]
    pub const fn positional(start: usize, length: usize) -> Self {
        Self::Positional { start, length }
    }

    /// Number of characters the field occupies.
    #[must_use]
    pub const fn length(&self) -> usize {
        match self {
            Self::Sequential { length, .. } | Self::Positional { length, .. } => *length,
        }
    }

    /// The line mode this layout belongs to.
    #[must_use]
    pub const fn mode(&self) -> LineMode {
        match self {
            Self::Sequential { .. } => LineMode::Sequential,
            Self::Positional { .. } => LineMode::Positional,
        }
    }

    /// Declared rank, for sequential layouts.
    #[must_use]
    pub const fn order(&self) -> Option<u32> {
        match self {
            Self::Sequential { order, .. } => Some(*order),
            Self::Positional { .. } => None,
        }
    }

    /// Explicit start offset, for positional layouts.
    #[must_use]
    pub const fn start(&self) -> Option<usize> {
        match self {
            Self::Sequential { .. } => None,
            Self::Positional { start, .. } => Some(*start),
        }
    }
}

/// Semantic kind of a field value.
///
/// The kind decides how an encoded value is padded: numeric kinds are
/// zero-filled on the left, everything else is space-filled on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Character data, assigned verbatim.
    Text,
    /// Whole numbers.
    Integer,
    /// Fractional numbers, optionally with implied decimal places.
    Decimal,
    /// Dates, times and timestamps.
    Date,
    /// Any other type with a registered conversion.
    Other,
}

impl ValueKind {
    /// Returns true for kinds that are zero-padded on encode.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }

    /// Returns true for text fields, which bypass conversion entirely.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Fill character used when padding an encoded value.
    #[must_use]
    pub const fn pad_char(self) -> char {
        if self.is_numeric() { '0' } else { ' ' }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}
