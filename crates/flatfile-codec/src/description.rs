//! Static record type descriptions.
//!
//! A record type opts in by implementing [`FlatRecord`] and returning a
//! [`RecordDescription`]: its line mode marker plus one entry per field,
//! each binding a layout and conversion rule to a typed member through a
//! pair of accessor functions.
//!
//! ```
//! use chrono::NaiveDate;
//! use flatfile_codec::{Conversion, FieldLayout, FlatRecord, LineMode, RecordDescription};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     id: i64,
//!     name: String,
//!     birth_date: NaiveDate,
//! }
//!
//! impl FlatRecord for Person {
//!     fn describe() -> RecordDescription<Self> {
//!         RecordDescription::<Self>::new("Person")
//!             .mode(LineMode::Sequential)
//!             .field("id", FieldLayout::sequential(1, 5), |p| &p.id, |p| &mut p.id)
//!             .field("name", FieldLayout::sequential(2, 20), |p| &p.name, |p| &mut p.name)
//!             .field_with(
//!                 "birth_date",
//!                 FieldLayout::sequential(3, 8),
//!                 Conversion::exact("yyyyMMdd"),
//!                 |p| &p.birth_date,
//!                 |p| &mut p.birth_date,
//!             )
//!     }
//! }
//! ```
//!
//! The description is only data; [`SchemaBuilder`](crate::SchemaBuilder)
//! validates it and resolves every conversion.

use flatfile_model::{Conversion, FieldLayout, LineMode, PARSE, ValueKind};

use crate::convert::{BoxError, ConversionRegistry, FieldConverter, FieldType};

/// A record type that can be read from and written to fixed-width lines.
pub trait FlatRecord: Default + Send + Sync + 'static {
    /// Static description of the record layout.
    ///
    /// Called once per schema builder; the result is validated and cached.
    fn describe() -> RecordDescription<Self>;
}

/// Declared layout of a record type, before validation.
pub struct RecordDescription<R> {
    name: &'static str,
    modes: Vec<LineMode>,
    fields: Vec<FieldSpec<R>>,
}

impl<R: 'static> RecordDescription<R> {
    /// Start a description for the named record type.
    ///
    /// Spell out the record type (`RecordDescription::<Self>::new(..)`) when
    /// `.field` follows directly, so the accessor closures can be typed.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            modes: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Add a line mode marker. Exactly one is required.
    #[must_use]
    pub fn mode(mut self, mode: LineMode) -> Self {
        self.modes.push(mode);
        self
    }

    /// Add a field using the default `parse` conversion.
    #[must_use]
    pub fn field<T: FieldType>(
        self,
        name: &'static str,
        layout: FieldLayout,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self {
        self.field_with(name, layout, Conversion::default(), get, get_mut)
    }

    /// Add a field with an explicit conversion rule.
    #[must_use]
    pub fn field_with<T: FieldType>(
        mut self,
        name: &'static str,
        layout: FieldLayout,
        conversion: Conversion,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self {
        self.fields.push(FieldSpec {
            name,
            layout,
            conversion,
            binding: Box::new(Binding { get, get_mut }),
        });
        self
    }

    /// Record type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared line mode markers.
    #[must_use]
    pub fn modes(&self) -> &[LineMode] {
        &self.modes
    }

    /// Declared fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec<R>] {
        &self.fields
    }

    pub(crate) fn into_parts(self) -> (&'static str, Vec<LineMode>, Vec<FieldSpec<R>>) {
        (self.name, self.modes, self.fields)
    }
}

/// One declared field.
pub struct FieldSpec<R> {
    name: &'static str,
    layout: FieldLayout,
    conversion: Conversion,
    binding: Box<dyn FieldBinding<R>>,
}

impl<R> FieldSpec<R> {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared layout.
    #[must_use]
    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    /// Declared conversion rule.
    #[must_use]
    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    /// Semantic kind of the bound member's type.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.binding.kind()
    }

    /// Name of the bound member's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.binding.type_name()
    }

    pub(crate) fn into_parts(self) -> (&'static str, FieldLayout, Conversion, Box<dyn FieldBinding<R>>) {
        (self.name, self.layout, self.conversion, self.binding)
    }
}

impl<R> std::fmt::Debug for FieldSpec<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("conversion", &self.conversion)
            .field("type", &self.type_name())
            .finish()
    }
}

/// Why a field's conversion could not be resolved.
pub(crate) enum ResolveError {
    /// No conversion under this rule for the member's type.
    Unresolved { rule: String },
    /// The conversion rejected its parameters.
    Invalid { rule: String, reason: String },
}

/// Typed member binding with its conversion still unresolved.
pub(crate) trait FieldBinding<R>: Send + Sync {
    fn kind(&self) -> ValueKind;

    fn type_name(&self) -> &'static str;

    /// Look up the conversion and prepare its parameters.
    fn resolve(
        &self,
        registry: &ConversionRegistry,
        conversion: &Conversion,
    ) -> Result<(Box<dyn FieldAccess<R>>, Conversion), ResolveError>;
}

/// Typed member binding with a resolved conversion.
pub(crate) trait FieldAccess<R>: Send + Sync {
    fn decode_into(&self, record: &mut R, text: &str, conversion: &Conversion)
    -> Result<(), BoxError>;

    fn encode_from(&self, record: &R, conversion: &Conversion) -> Result<String, BoxError>;
}

struct Binding<R, T> {
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R: 'static, T: FieldType> FieldBinding<R> for Binding<R, T> {
    fn kind(&self) -> ValueKind {
        T::KIND
    }

    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn resolve(
        &self,
        registry: &ConversionRegistry,
        conversion: &Conversion,
    ) -> Result<(Box<dyn FieldAccess<R>>, Conversion), ResolveError> {
        // Text is assigned verbatim whatever rule was declared.
        let rule = if T::KIND.is_text() {
            PARSE
        } else {
            conversion.rule.as_str()
        };

        let converter = registry
            .resolve::<T>(rule)
            .ok_or_else(|| ResolveError::Unresolved {
                rule: rule.to_string(),
            })?;

        let prepared = if T::KIND.is_text() {
            conversion.clone()
        } else {
            (converter.prepare)(conversion).map_err(|reason| ResolveError::Invalid {
                rule: rule.to_string(),
                reason,
            })?
        };

        let access = BoundField {
            get: self.get,
            get_mut: self.get_mut,
            converter,
        };
        Ok((Box::new(access), prepared))
    }
}

struct BoundField<R, T> {
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
    converter: FieldConverter<T>,
}

impl<R, T: FieldType> FieldAccess<R> for BoundField<R, T> {
    fn decode_into(
        &self,
        record: &mut R,
        text: &str,
        conversion: &Conversion,
    ) -> Result<(), BoxError> {
        let value = (self.converter.parse)(text, conversion)?;
        *(self.get_mut)(record) = value;
        Ok(())
    }

    fn encode_from(&self, record: &R, conversion: &Conversion) -> Result<String, BoxError> {
        (self.converter.format)((self.get)(record), conversion)
    }
}
