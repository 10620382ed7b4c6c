//! Conversion rules.

use serde::{Deserialize, Serialize};

/// Default rule: the value type's standard text parser.
pub const PARSE: &str = "parse";

/// Exact-format rule for dates and times; requires a pattern.
pub const PARSE_EXACT: &str = "parse_exact";

/// Scaled-decimal rule: digits with an implied decimal point.
pub const SCALED: &str = "scaled";

/// A named conversion rule plus its parameters.
///
/// The rule name is looked up in the codec's conversion registry for the
/// field's value type when the schema is built. Text fields ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversion {
    /// Rule identifier (e.g. `parse`, `parse_exact`, `scaled`).
    pub rule: String,
    /// Date/time pattern for exact-format rules.
    pub pattern: Option<String>,
    /// Implied decimal places for scaled rules (default: 0).
    pub places: u32,
}

impl Default for Conversion {
    fn default() -> Self {
        Self {
            rule: PARSE.to_string(),
            pattern: None,
            places: 0,
        }
    }
}

impl Conversion {
    /// The default `parse` rule.
    #[must_use]
    pub fn parse() -> Self {
        Self::default()
    }

    /// Exact-format rule with the given date/time pattern.
    #[must_use]
    pub fn exact(pattern: impl Into<String>) -> Self {
        Self {
            rule: PARSE_EXACT.to_string(),
            pattern: Some(pattern.into()),
            places: 0,
        }
    }

    /// Scaled-decimal rule with `places` implied decimal places.
    #[must_use]
    pub fn scaled(places: u32) -> Self {
        Self {
            rule: SCALED.to_string(),
            pattern: None,
            places,
        }
    }

    /// A custom rule registered by the caller.
    #[must_use]
    pub fn named(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            ..Self::default()
        }
    }

    /// Attach a pattern parameter.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Attach a decimal places parameter.
    #[must_use]
    pub fn with_places(mut self, places: u32) -> Self {
        self.places = places;
        self
    }

    /// Whether this is the default rule with no parameters.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rule)?;
        if let Some(pattern) = &self.pattern {
            write!(f, "(\"{pattern}\")")?;
        } else if self.places > 0 {
            write!(f, "({} places)", self.places)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let conv = Conversion::default();
        assert_eq!(conv.rule, PARSE);
        assert_eq!(conv.pattern, None);
        assert_eq!(conv.places, 0);
        assert!(conv.is_default());
    }

    #[test]
    fn test_constructors() {
        let exact = Conversion::exact("yyyyMMdd");
        assert_eq!(exact.rule, PARSE_EXACT);
        assert_eq!(exact.pattern.as_deref(), Some("yyyyMMdd"));

        let scaled = Conversion::scaled(2);
        assert_eq!(scaled.rule, SCALED);
        assert_eq!(scaled.places, 2);
        assert!(!scaled.is_default());

        let parse_places = Conversion::parse().with_places(2);
        assert_eq!(parse_places.rule, PARSE);
        assert_eq!(parse_places.places, 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Conversion::parse().to_string(), "parse");
        assert_eq!(
            Conversion::exact("%Y%m%d").to_string(),
            "parse_exact(\"%Y%m%d\")"
        );
        assert_eq!(Conversion::scaled(2).to_string(), "scaled(2 places)");
    }
}
