//! Organization resource wire model.
//!
//! Used for the plan's owning insurer, its third-party administrator and every provider network
//! listed in the plan.

use crate::datatypes::{CodeableConcept, ContactDetail, Identifier, Meta, Narrative};
use crate::validation::{check_string, validate_all, Validate};
use crate::FhirResult;
use nhcx_uuid::ResourceId;
use serde::Serialize;

/// An Organization resource.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Organization {
    pub id: ResourceId,

    pub meta: Meta,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(rename = "type", skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<CodeableConcept>,

    pub name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<ContactDetail>,
}

impl Organization {
    pub const RESOURCE_TYPE: &'static str = "Organization";

    /// Validates the complete resource.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError::Validation`] naming the first offending element.
    pub fn validate(&self) -> FhirResult<()> {
        self.validate_at(Self::RESOURCE_TYPE)
    }
}

impl Validate for Organization {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        self.meta.validate_at(&format!("{path}.meta"))?;
        self.text.validate_at(&format!("{path}.text"))?;
        validate_all(&self.identifier, &format!("{path}.identifier"))?;
        validate_all(&self.type_, &format!("{path}.type"))?;
        check_string(&format!("{path}.name"), &self.name)?;
        validate_all(&self.contact, &format!("{path}.contact"))
    }
}
