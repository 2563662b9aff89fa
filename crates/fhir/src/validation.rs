//! Structural validation of FHIR primitive values and elements.
//!
//! These checks mirror what an external FHIR validator rejects for the element types used in an
//! insurance-plan bundle. Builders run them before a value escapes, so an invalid intermediate
//! value surfaces as a [`FhirError::Validation`] carrying the element path instead of a broken
//! document.

use crate::{FhirError, FhirResult};
use chrono::{DateTime, NaiveDate};

/// Implemented by every wire element that can be validated in isolation.
pub trait Validate {
    /// Validates this element, reporting failures relative to `path` (for example
    /// `InsurancePlan.coverage[0].benefit[1]`).
    fn validate_at(&self, path: &str) -> FhirResult<()>;
}

impl<T: Validate> Validate for Option<T> {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        match self {
            Some(inner) => inner.validate_at(path),
            None => Ok(()),
        }
    }
}

/// Validates each element of a list as `path[i]`.
pub(crate) fn validate_all<T: Validate>(items: &[T], path: &str) -> FhirResult<()> {
    items
        .iter()
        .enumerate()
        .try_for_each(|(i, item)| item.validate_at(&format!("{path}[{i}]")))
}

pub(crate) fn invalid(path: &str, message: impl Into<String>) -> FhirError {
    FhirError::Validation {
        path: path.to_string(),
        message: message.into(),
    }
}

/// FHIR `string`: must contain at least one non-whitespace character.
pub fn check_string(path: &str, value: &str) -> FhirResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(path, "string must not be empty"));
    }
    Ok(())
}

/// FHIR `code`: `[^\s]+(\s[^\s]+)*`, with no leading, trailing or repeated whitespace.
pub fn check_code(path: &str, value: &str) -> FhirResult<()> {
    if value.is_empty() {
        return Err(invalid(path, "code must not be empty"));
    }
    let mut previous_was_space = true;
    for c in value.chars() {
        let is_space = c.is_whitespace();
        if is_space && previous_was_space {
            return Err(invalid(
                path,
                format!("code '{value}' has leading or repeated whitespace"),
            ));
        }
        previous_was_space = is_space;
    }
    if previous_was_space {
        return Err(invalid(path, format!("code '{value}' has trailing whitespace")));
    }
    Ok(())
}

/// Language tag (BCP 47 shape): a 2 or 3 letter primary subtag followed by `-`-separated
/// alphanumeric subtags of 1 to 8 characters, e.g. `en`, `en-IN`, `hi-Deva-IN`.
pub fn check_language_tag(path: &str, value: &str) -> FhirResult<()> {
    let mut subtags = value.split('-');
    let primary_ok = subtags
        .next()
        .is_some_and(|p| (2..=3).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_alphabetic()));
    let rest_ok = subtags.all(|s| (1..=8).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphanumeric()));
    if !primary_ok || !rest_ok {
        return Err(invalid(path, format!("'{value}' is not a language tag")));
    }
    Ok(())
}

/// FHIR `uri`: non-empty and free of whitespace.
pub fn check_uri(path: &str, value: &str) -> FhirResult<()> {
    if value.is_empty() {
        return Err(invalid(path, "uri must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(path, format!("uri '{value}' contains whitespace")));
    }
    Ok(())
}

/// FHIR `id`: 1 to 64 characters from `[A-Za-z0-9\-\.]`.
pub fn check_id(path: &str, value: &str) -> FhirResult<()> {
    let ok = (1..=64).contains(&value.len())
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.');
    if !ok {
        return Err(invalid(path, format!("id '{value}' does not match [A-Za-z0-9-.]{{1,64}}")));
    }
    Ok(())
}

/// FHIR `dateTime` (and `date`): `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, or a full RFC 3339 timestamp.
pub fn check_date_time(path: &str, value: &str) -> FhirResult<()> {
    let year_ok = |y: &str| y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit());
    let valid = match value.len() {
        4 => year_ok(value),
        7 => {
            let (year, rest) = value.split_at(4);
            let month = rest.strip_prefix('-').and_then(|m| m.parse::<u32>().ok());
            year_ok(year)
                && rest.len() == 3
                && rest[1..].bytes().all(|b| b.is_ascii_digit())
                && matches!(month, Some(1..=12))
        }
        10 => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        _ => DateTime::parse_from_rfc3339(value).is_ok(),
    };
    if !valid {
        return Err(invalid(path, format!("'{value}' is not a valid FHIR dateTime")));
    }
    Ok(())
}

/// Narrative `div`: an XHTML `<div>` element in the XHTML namespace.
pub fn check_xhtml_div(path: &str, value: &str) -> FhirResult<()> {
    let trimmed = value.trim();
    if !trimmed.starts_with("<div") || !trimmed.ends_with("</div>") {
        return Err(invalid(path, "narrative must be a single <div> element"));
    }
    if !trimmed.contains(r#"xmlns="http://www.w3.org/1999/xhtml""#) {
        return Err(invalid(path, "narrative div must declare the XHTML namespace"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_accepts_single_internal_spaces() {
        assert!(check_code("c", "in-network").is_ok());
        assert!(check_code("c", "full coverage").is_ok());
        assert!(check_code("c", "UNK").is_ok());
    }

    #[test]
    fn code_rejects_bad_whitespace() {
        for bad in ["", " copay", "copay ", "co  pay", "co\t\tpay"] {
            let err = check_code("cost.type", bad).expect_err("should reject");
            assert!(matches!(err, FhirError::Validation { ref path, .. } if path == "cost.type"));
        }
    }

    #[test]
    fn language_tag_shape() {
        for ok in ["en", "en-IN", "hi-Deva-IN", "mar"] {
            assert!(check_language_tag("language", ok).is_ok(), "{ok} should be valid");
        }
        for bad in ["", "English", "en IN", "en--IN", "e", "en-", "en_IN", "12-IN"] {
            assert!(check_language_tag("language", bad).is_err(), "{bad} should be invalid");
        }
    }

    #[test]
    fn uri_rejects_whitespace() {
        assert!(check_uri("u", "http://snomed.info/sct").is_ok());
        assert!(check_uri("u", "http://example.org/a b").is_err());
        assert!(check_uri("u", "").is_err());
    }

    #[test]
    fn id_enforces_pattern_and_length() {
        assert!(check_id("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(check_id("id", "a_b").is_err());
        assert!(check_id("id", &"a".repeat(65)).is_err());
        assert!(check_id("id", "").is_err());
    }

    #[test]
    fn date_time_accepts_fhir_precisions() {
        for ok in ["2024", "2024-04", "2024-04-01", "2024-04-01T10:30:00+05:30", "2024-04-01T10:30:00Z"] {
            assert!(check_date_time("p", ok).is_ok(), "{ok} should be valid");
        }
    }

    #[test]
    fn date_time_rejects_free_text() {
        for bad in ["April 2024", "2024-13", "2024-02-30", "24-04-01", "2024-04-01 10:30"] {
            assert!(check_date_time("p", bad).is_err(), "{bad} should be invalid");
        }
    }

    #[test]
    fn xhtml_div_requires_namespace() {
        assert!(check_xhtml_div("t", r#"<div xmlns="http://www.w3.org/1999/xhtml"><p>x</p></div>"#).is_ok());
        assert!(check_xhtml_div("t", "<div><p>x</p></div>").is_err());
        assert!(check_xhtml_div("t", "<p>x</p>").is_err());
    }
}
