//! Concept and narrative value builders.
//!
//! Pure functions with no state. Blank strings are treated as absent throughout.

use crate::constants::{SYS_NULL_FLAVOR, UNKNOWN_CODE, UNKNOWN_DISPLAY};
use fhir::{CodeableConcept, Coding, Narrative, NarrativeStatus};

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Collapses runs of whitespace inside a code to single spaces, so free-text codes such as
/// `01  A` still satisfy the FHIR code rule.
fn normalise_code(code: &str) -> String {
    code.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds a concept.
///
/// With no code and no system the concept is text only, using `text` or else `display`. With
/// either present a single coding is emitted; a missing code becomes `unknown` and a missing
/// system becomes the null-flavor system, so code and system always travel together.
///
/// Returns `None` when there would be nothing to emit.
pub fn concept(
    code: Option<&str>,
    display: Option<&str>,
    system: Option<&str>,
    text: Option<&str>,
) -> Option<CodeableConcept> {
    let (code, display, system, text) =
        (present(code), present(display), present(system), present(text));

    if code.is_none() && system.is_none() {
        return text.or(display).map(CodeableConcept::from_text);
    }

    Some(CodeableConcept {
        coding: vec![Coding {
            system: Some(system.unwrap_or(SYS_NULL_FLAVOR).to_string()),
            code: Some(code.map_or_else(|| UNKNOWN_CODE.to_string(), normalise_code)),
            display: display.map(str::to_string),
        }],
        text: text.map(str::to_string),
    })
}

/// As [`concept`], for elements the profile makes mandatory: an empty result becomes the explicit
/// unknown coding.
pub fn required_concept(
    code: Option<&str>,
    display: Option<&str>,
    system: Option<&str>,
    text: Option<&str>,
) -> CodeableConcept {
    concept(code, display, system, text).unwrap_or_else(unknown_concept)
}

/// The explicit unknown coding: null-flavor `unknown`, displayed as `Unknown`.
pub fn unknown_concept() -> CodeableConcept {
    CodeableConcept {
        coding: vec![Coding {
            system: Some(SYS_NULL_FLAVOR.to_string()),
            code: Some(UNKNOWN_CODE.to_string()),
            display: Some(UNKNOWN_DISPLAY.to_string()),
        }],
        text: None,
    }
}

/// Wraps `summary` as a generated XHTML narrative, escaping markup characters.
pub fn narrative(summary: &str) -> Narrative {
    let safe = summary
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    Narrative {
        status: NarrativeStatus::Generated,
        div: format!(r#"<div xmlns="http://www.w3.org/1999/xhtml"><p>{safe}</p></div>"#),
    }
}
