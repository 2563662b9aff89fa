//! FHIR complex datatypes used by the insurance-plan bundle.
//!
//! The wire structs serialise straight to FHIR JSON: absent optionals and empty lists are
//! omitted, mirroring an `exclude_none` dump. Each type implements [`Validate`] so that the
//! structural rules of the target schema are enforced where the value is built.

use crate::validation::{
    check_code, check_date_time, check_string, check_uri, check_xhtml_div, invalid, validate_all,
    Validate,
};
use crate::FhirResult;
use nhcx_types::FiniteDecimal;
use nhcx_uuid::ResourceId;
use serde::Serialize;

// ============================================================================
// Coding / CodeableConcept
// ============================================================================

/// A single code from a code system.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Validate for Coding {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        if let Some(system) = &self.system {
            check_uri(&format!("{path}.system"), system)?;
        }
        if let Some(code) = &self.code {
            check_code(&format!("{path}.code"), code)?;
        }
        if let Some(display) = &self.display {
            check_string(&format!("{path}.display"), display)?;
        }
        if self.system.is_none() && self.code.is_none() && self.display.is_none() {
            return Err(invalid(path, "coding must have a system, code or display"));
        }
        Ok(())
    }
}

/// A concept expressed as codings and/or free text.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CodeableConcept {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// A concept carrying only free text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }

    /// Returns true when the concept carries neither codings nor text.
    pub fn is_empty(&self) -> bool {
        self.coding.is_empty() && self.text.is_none()
    }

    /// First coding's code, if any.
    pub fn first_code(&self) -> Option<&str> {
        self.coding.first().and_then(|c| c.code.as_deref())
    }
}

impl Validate for CodeableConcept {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        if self.is_empty() {
            return Err(invalid(path, "concept must have a coding or text"));
        }
        validate_all(&self.coding, &format!("{path}.coding"))?;
        if let Some(text) = &self.text {
            check_string(&format!("{path}.text"), text)?;
        }
        Ok(())
    }
}

// ============================================================================
// Identifier
// ============================================================================

/// Purpose of an identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierUse {
    Usual,
    Official,
    Temp,
    Secondary,
    Old,
}

/// A business identifier scoped by a system URI.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Identifier {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<IdentifierUse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Identifier {
    /// An `official` identifier with the given system and value.
    pub fn official(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            use_type: Some(IdentifierUse::Official),
            system: Some(system.into()),
            value: Some(value.into()),
        }
    }
}

impl Validate for Identifier {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        if let Some(system) = &self.system {
            check_uri(&format!("{path}.system"), system)?;
        }
        match &self.value {
            Some(value) => check_string(&format!("{path}.value"), value),
            None if self.system.is_none() => {
                Err(invalid(path, "identifier must have a system or value"))
            }
            None => Ok(()),
        }
    }
}

// ============================================================================
// ContactPoint / HumanName / ContactDetail
// ============================================================================

/// Telecommunications form of a contact point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPointSystem {
    Phone,
    Fax,
    Email,
    Pager,
    Url,
    Sms,
    Other,
}

/// A phone number, email address or URL.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContactPoint {
    pub system: ContactPointSystem,
    pub value: String,
}

impl ContactPoint {
    pub fn new(system: ContactPointSystem, value: impl Into<String>) -> Self {
        Self {
            system,
            value: value.into(),
        }
    }
}

impl Validate for ContactPoint {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        check_string(&format!("{path}.value"), &self.value)
    }
}

/// A person's name, held here as unstructured text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HumanName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl HumanName {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

impl Validate for HumanName {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        match &self.text {
            Some(text) => check_string(&format!("{path}.text"), text),
            None => Err(invalid(path, "name must have text")),
        }
    }
}

/// Contact party for an organization or plan.
///
/// `name` is held as a list: the builders always wrap a contact's name as a single-element
/// list, while the target schema expects a single object at `contact.name`. The bundle
/// assembler collapses the list during serialisation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ContactDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
}

impl ContactDetail {
    /// Returns true when no member is populated.
    pub fn is_empty(&self) -> bool {
        self.purpose.is_none() && self.name.is_empty() && self.telecom.is_empty()
    }
}

impl Validate for ContactDetail {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        if self.is_empty() {
            return Err(invalid(path, "contact must have a purpose, name or telecom"));
        }
        if self.name.len() > 1 {
            return Err(invalid(
                &format!("{path}.name"),
                "contact may carry at most one name",
            ));
        }
        self.purpose.validate_at(&format!("{path}.purpose"))?;
        validate_all(&self.name, &format!("{path}.name"))?;
        validate_all(&self.telecom, &format!("{path}.telecom"))
    }
}

// ============================================================================
// Reference
// ============================================================================

/// A pointer to another resource in the same bundle, or a display-only logical reference.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    /// A reference to the resource with `id`, in `urn:uuid:` form.
    pub fn to(id: &ResourceId, display: Option<String>) -> Self {
        Self {
            reference: Some(id.urn()),
            display,
        }
    }

    /// A reference carrying only display text and no target.
    pub fn display_only(display: impl Into<String>) -> Self {
        Self {
            reference: None,
            display: Some(display.into()),
        }
    }

    /// The targeted resource id, if this reference has a `urn:uuid:` target.
    pub fn target(&self) -> Option<ResourceId> {
        self.reference
            .as_deref()
            .and_then(|r| ResourceId::from_urn(r).ok())
    }
}

impl Validate for Reference {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        if let Some(reference) = &self.reference {
            check_string(&format!("{path}.reference"), reference)?;
        }
        if let Some(display) = &self.display {
            check_string(&format!("{path}.display"), display)?;
        }
        if self.reference.is_none() && self.display.is_none() {
            return Err(invalid(path, "reference must have a target or display"));
        }
        Ok(())
    }
}

// ============================================================================
// Quantity / Period
// ============================================================================

/// A measured amount with optional unit text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quantity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FiniteDecimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Validate for Quantity {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        if let Some(unit) = &self.unit {
            check_string(&format!("{path}.unit"), unit)?;
        }
        if self.value.is_none() && self.unit.is_none() {
            return Err(invalid(path, "quantity must have a value or unit"));
        }
        Ok(())
    }
}

/// A time range with optional bounds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl Validate for Period {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        if let Some(start) = &self.start {
            check_date_time(&format!("{path}.start"), start)?;
        }
        if let Some(end) = &self.end {
            check_date_time(&format!("{path}.end"), end)?;
        }
        if self.start.is_none() && self.end.is_none() {
            return Err(invalid(path, "period must have a start or end"));
        }
        Ok(())
    }
}

// ============================================================================
// Meta / Narrative
// ============================================================================

/// Resource metadata; only profile claims are emitted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

impl Meta {
    pub fn with_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: vec![profile.into()],
        }
    }
}

impl Validate for Meta {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        self.profile
            .iter()
            .enumerate()
            .try_for_each(|(i, p)| check_uri(&format!("{path}.profile[{i}]"), p))
    }
}

/// Status of a resource narrative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStatus {
    Generated,
    Extensions,
    Additional,
    Empty,
}

/// Human-readable XHTML summary of a resource.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Narrative {
    pub status: NarrativeStatus,
    pub div: String,
}

impl Validate for Narrative {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        check_xhtml_div(&format!("{path}.div"), &self.div)
    }
}

// ============================================================================
// Extension
// ============================================================================

/// The `value[x]` of an extension, limited to the types this bundle uses.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ExtensionValue {
    #[serde(rename = "valueString")]
    String(String),
    #[serde(rename = "valueCodeableConcept")]
    CodeableConcept(CodeableConcept),
}

/// A simple (valued) or complex (nested) extension.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Extension {
    pub url: String,

    #[serde(flatten)]
    pub value: Option<ExtensionValue>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Extension {
    /// An extension carrying a single value.
    pub fn simple(url: impl Into<String>, value: ExtensionValue) -> Self {
        Self {
            url: url.into(),
            value: Some(value),
            extension: Vec::new(),
        }
    }

    /// An extension made only of nested extensions.
    pub fn complex(url: impl Into<String>, extension: Vec<Extension>) -> Self {
        Self {
            url: url.into(),
            value: None,
            extension,
        }
    }
}

impl Validate for Extension {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        check_uri(&format!("{path}.url"), &self.url)?;
        match (&self.value, self.extension.is_empty()) {
            (Some(_), false) => Err(invalid(
                path,
                "extension must not have both a value and nested extensions",
            )),
            (None, true) => Err(invalid(path, "extension must have a value or nested extensions")),
            (Some(ExtensionValue::String(s)), true) => {
                check_string(&format!("{path}.valueString"), s)
            }
            (Some(ExtensionValue::CodeableConcept(c)), true) => {
                c.validate_at(&format!("{path}.valueCodeableConcept"))
            }
            (None, false) => validate_all(&self.extension, &format!("{path}.extension")),
        }
    }
}
