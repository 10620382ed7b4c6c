//! Typed conversion registry.
//!
//! Every non-text field names a conversion rule (see [`Conversion`]). When a
//! schema is built, the rule is looked up in a [`ConversionRegistry`] under the
//! field's value type and the resulting [`FieldConverter`] is stored in the
//! field descriptor, so decoding never searches for a conversion by name.
//!
//! # Registered rules
//!
//! | Value type                                   | Rules                             |
//! |----------------------------------------------|-----------------------------------|
//! | `String`                                     | `parse` (verbatim)                |
//! | `i8`..`i128`, `u8`..`u128`, `isize`, `usize` | `parse`                           |
//! | `f32`, `f64`, `Decimal`                      | `parse`, `scaled`                 |
//! | `NaiveDate`, `NaiveDateTime`, `NaiveTime`    | `parse` (ISO 8601), `parse_exact` |
//! | `bool`, `char`                               | `parse`                           |
//!
//! Callers add their own types and rules with [`ConversionRegistry::register`]
//! or [`ConversionRegistry::register_from_str`].

mod builtin;
pub mod pattern;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use flatfile_model::{Conversion, PARSE, ValueKind};

/// Boxed error returned by conversion functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Text to value.
pub type ParseFn<T> = fn(&str, &Conversion) -> Result<T, BoxError>;

/// Value to text (before padding).
pub type FormatFn<T> = fn(&T, &Conversion) -> Result<String, BoxError>;

/// Checks and normalizes a rule's parameters once, at schema build time.
pub type PrepareFn = fn(&Conversion) -> Result<Conversion, String>;

/// A type that can be stored in a record field.
pub trait FieldType: Send + Sync + 'static {
    /// Semantic kind, which decides padding on encode.
    const KIND: ValueKind;

    /// Human-readable type name for error messages.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Parse and format functions for one rule on one value type.
pub struct FieldConverter<T> {
    /// Text to value.
    pub parse: ParseFn<T>,
    /// Value to text.
    pub format: FormatFn<T>,
    /// Parameter check run when the schema is built.
    pub prepare: PrepareFn,
}

impl<T> FieldConverter<T> {
    /// Create a converter whose parameters need no preparation.
    pub fn new(parse: ParseFn<T>, format: FormatFn<T>) -> Self {
        Self {
            parse,
            format,
            prepare: accept_parameters,
        }
    }

    /// Attach a parameter check.
    #[must_use]
    pub fn with_prepare(mut self, prepare: PrepareFn) -> Self {
        self.prepare = prepare;
        self
    }
}

impl<T> Clone for FieldConverter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldConverter<T> {}

impl<T> std::fmt::Debug for FieldConverter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldConverter").finish_non_exhaustive()
    }
}

fn accept_parameters(conversion: &Conversion) -> Result<Conversion, String> {
    Ok(conversion.clone())
}

/// Registry of conversions keyed by value type and rule name.
pub struct ConversionRegistry {
    entries: HashMap<TypeId, HashMap<String, Box<dyn Any + Send + Sync>>>,
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionRegistry {
    /// Create a registry with the built-in conversions.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
        };
        builtin::register_builtins(&mut registry);
        registry
    }

    /// Register a conversion for `T` under `rule`.
    ///
    /// An existing conversion with the same type and rule is replaced.
    pub fn register<T: FieldType>(
        &mut self,
        rule: impl Into<String>,
        converter: FieldConverter<T>,
    ) -> &mut Self {
        self.entries
            .entry(TypeId::of::<T>())
            .or_default()
            .insert(rule.into(), Box::new(converter));
        self
    }

    /// Register the default `parse` rule for a type using `FromStr` and `Display`.
    pub fn register_from_str<T>(&mut self) -> &mut Self
    where
        T: FieldType + FromStr + Display,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.register::<T>(
            PARSE,
            FieldConverter::new(parse_from_str::<T>, format_display::<T>),
        )
    }

    /// Look up the conversion for `T` under `rule`.
    #[must_use]
    pub fn resolve<T: FieldType>(&self, rule: &str) -> Option<FieldConverter<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|rules| rules.get(rule))
            .and_then(|entry| entry.downcast_ref::<FieldConverter<T>>())
            .copied()
    }

    /// Whether a conversion for `T` under `rule` exists.
    #[must_use]
    pub fn contains<T: FieldType>(&self, rule: &str) -> bool {
        self.resolve::<T>(rule).is_some()
    }

    /// Rule names registered for `T`, sorted.
    #[must_use]
    pub fn rules_for<T: FieldType>(&self) -> Vec<&str> {
        let mut rules: Vec<&str> = self
            .entries
            .get(&TypeId::of::<T>())
            .map(|rules| rules.keys().map(String::as_str).collect())
            .unwrap_or_default();
        rules.sort_unstable();
        rules
    }
}

impl std::fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rules: usize = self.entries.values().map(HashMap::len).sum();
        f.debug_struct("ConversionRegistry")
            .field("types", &self.entries.len())
            .field("rules", &rules)
            .finish()
    }
}

fn parse_from_str<T>(text: &str, _: &Conversion) -> Result<T, BoxError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(text.trim().parse::<T>()?)
}

fn format_display<T: Display>(value: &T, _: &Conversion) -> Result<String, BoxError> {
    Ok(value.to_string())
}
