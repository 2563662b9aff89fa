//! Small validated value types shared by the FHIR wire crate and the mapping core.
//!
//! Extracted insurance records are loosely shaped: strings may be blank and numbers may arrive
//! as text. The types here turn those raw inputs into values that carry their guarantees in the
//! type system, so downstream builders never re-check for blank text or non-finite numbers.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated value types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input could not be read as a decimal number
    #[error("not a decimal number: '{0}'")]
    NotANumber(String),

    /// The input parsed as a number but is NaN or infinite
    #[error("decimal must be finite, got '{0}'")]
    NotFinite(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so a
/// `NonEmptyText` never starts or ends with whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<NonEmptyText> for String {
    fn from(value: NonEmptyText) -> Self {
        value.0
    }
}

impl FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A decimal value that is guaranteed to be finite.
///
/// FHIR `decimal` has no representation for NaN or infinity, so quantities are built from this
/// type rather than a bare `f64`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FiniteDecimal(f64);

impl FiniteDecimal {
    /// The zero value used as the documented fallback for unparseable amounts.
    pub const ZERO: FiniteDecimal = FiniteDecimal(0.0);

    /// Wraps an `f64`, rejecting NaN and infinities.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::NotFinite`] if `value` is not finite.
    pub fn new(value: f64) -> Result<Self, TextError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(TextError::NotFinite(value.to_string()))
        }
    }

    /// Parses a decimal from text, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input, [`TextError::NotANumber`] when the text is
    /// not a number, and [`TextError::NotFinite`] for `NaN`/`inf` spellings.
    pub fn parse(input: &str) -> Result<Self, TextError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|_| TextError::NotANumber(trimmed.to_owned()))?;
        if !value.is_finite() {
            return Err(TextError::NotFinite(trimmed.to_owned()));
        }
        Ok(Self(value))
    }

    /// Returns the wrapped value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for FiniteDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for FiniteDecimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for FiniteDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        FiniteDecimal::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Gold Plan \n").expect("valid text");
        assert_eq!(text.as_str(), "Gold Plan");
    }

    #[test]
    fn non_empty_text_rejects_whitespace_only() {
        let err = NonEmptyText::new(" \t ").expect_err("should reject whitespace");
        assert_eq!(err, TextError::Empty);
    }

    #[test]
    fn finite_decimal_parses_plain_numbers() {
        let value = FiniteDecimal::parse(" 5000 ").expect("parse");
        assert_eq!(value.value(), 5000.0);
        let value = FiniteDecimal::parse("12.75").expect("parse");
        assert_eq!(value.value(), 12.75);
    }

    #[test]
    fn finite_decimal_rejects_garbage_and_non_finite() {
        assert!(matches!(
            FiniteDecimal::parse("abc"),
            Err(TextError::NotANumber(s)) if s == "abc"
        ));
        assert!(matches!(FiniteDecimal::parse("NaN"), Err(TextError::NotFinite(_))));
        assert!(matches!(FiniteDecimal::parse("inf"), Err(TextError::NotFinite(_))));
        assert!(matches!(FiniteDecimal::parse(""), Err(TextError::Empty)));
    }

    #[test]
    fn finite_decimal_serialises_as_json_number() {
        let json = serde_json::to_string(&FiniteDecimal::ZERO).expect("serialise");
        assert_eq!(json, "0.0");
    }
}
