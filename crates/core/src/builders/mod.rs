//! Resource builders.
//!
//! One builder per resource or backbone element. Each reads a sub-record, writes defaults for
//! anything missing (recording a warning), validates what it built, and either returns the value
//! or drops it with a logged error. Only the InsurancePlan builder fails outward, handing a
//! validation failure to the mapper.

mod contact;
mod cost;
mod coverage;
mod insurance_plan;
mod organization;

pub use contact::build_contacts;
pub use cost::{applicability_display, applicability_for, build_financial_plans};
pub use coverage::build_coverages;
pub use insurance_plan::build_insurance_plan;
pub use organization::{build_networks, build_organization, OrganizationRole};

use crate::assembler::BundleAssembler;
use crate::constants::SYS_SNOMED;
use crate::diagnostics::Diagnostics;
use crate::primitives::required_concept;
use crate::record::Record;
use crate::terminology::Terminology;
use fhir::{CodeableConcept, ContactPoint, ContactPointSystem};

/// State shared by the builders during one mapping call.
pub struct BuildContext<'a> {
    pub terminology: &'a Terminology,
    pub diagnostics: Diagnostics,
    pub assembler: BundleAssembler,
    pub language: &'a str,
}

impl<'a> BuildContext<'a> {
    pub fn new(terminology: &'a Terminology, language: &'a str) -> Self {
        Self {
            terminology,
            diagnostics: Diagnostics::new(),
            assembler: BundleAssembler::new(language),
            language,
        }
    }

    /// Resolves a code/display pair and builds a mandatory concept from it.
    ///
    /// A purely numeric resolved code is tagged as SNOMED CT. Anything else is emitted as text
    /// only, since there is no system to claim for it.
    pub fn terminology_concept(
        &self,
        code: Option<&str>,
        display: Option<&str>,
    ) -> CodeableConcept {
        let resolved = self.terminology.resolve(code, display);
        match resolved.code.as_deref() {
            Some(code) if is_numeric_code(code) => required_concept(
                Some(code),
                resolved.display.as_deref(),
                Some(SYS_SNOMED),
                None,
            ),
            code => required_concept(None, resolved.display.as_deref().or(code), None, None),
        }
    }
}

fn is_numeric_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

/// Contact points for each non-blank key in `fields`, in order.
fn telecom(record: &Record<'_>, fields: &[(&str, ContactPointSystem)]) -> Vec<ContactPoint> {
    fields
        .iter()
        .filter_map(|(key, system)| {
            record
                .text(key)
                .map(|value| ContactPoint::new(*system, value.into_string()))
        })
        .collect()
}
