//! InsurancePlan resource wire model and its backbone elements.
//!
//! Shape:
//! - `coverage[]`: what is covered, each with one or more `benefit[]` and optional `limit[]`
//! - `plan[]`: financial plans, each with `specificCost[]` blocks of category → benefit → cost

use crate::datatypes::{
    CodeableConcept, ContactDetail, Extension, Identifier, Meta, Narrative, Period, Quantity,
    Reference,
};
use crate::validation::{check_language_tag, check_string, invalid, validate_all, Validate};
use crate::FhirResult;
use nhcx_uuid::ResourceId;
use serde::Serialize;

/// Publication status of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Draft,
    Active,
    Retired,
    Unknown,
}

impl PublicationStatus {
    /// Parses a status code, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "retired" => Some(Self::Retired),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Retired => "retired",
            Self::Unknown => "unknown",
        }
    }
}

/// An InsurancePlan resource.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsurancePlan {
    pub id: ResourceId,

    pub meta: Meta,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    pub status: PublicationStatus,

    #[serde(rename = "type", skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<CodeableConcept>,

    pub name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    pub owned_by: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub administered_by: Option<Reference>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coverage_area: Vec<Reference>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<ContactDetail>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network: Vec<Reference>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coverage: Vec<Coverage>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plan: Vec<FinancialPlan>,
}

impl InsurancePlan {
    pub const RESOURCE_TYPE: &'static str = "InsurancePlan";

    /// Validates the complete resource.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError::Validation`] naming the first offending element.
    pub fn validate(&self) -> FhirResult<()> {
        self.validate_at(Self::RESOURCE_TYPE)
    }

    /// Every reference in the plan that carries a target.
    pub fn targeted_references(&self) -> impl Iterator<Item = &Reference> {
        std::iter::once(&self.owned_by)
            .chain(self.administered_by.iter())
            .chain(self.network.iter())
            .chain(self.coverage_area.iter())
            .filter(|r| r.reference.is_some())
    }
}

impl Validate for InsurancePlan {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        self.meta.validate_at(&format!("{path}.meta"))?;
        self.text.validate_at(&format!("{path}.text"))?;
        if let Some(language) = &self.language {
            check_language_tag(&format!("{path}.language"), language)?;
        }
        validate_all(&self.extension, &format!("{path}.extension"))?;
        validate_all(&self.identifier, &format!("{path}.identifier"))?;
        validate_all(&self.type_, &format!("{path}.type"))?;
        check_string(&format!("{path}.name"), &self.name)?;
        self.alias
            .iter()
            .enumerate()
            .try_for_each(|(i, a)| check_string(&format!("{path}.alias[{i}]"), a))?;
        self.period.validate_at(&format!("{path}.period"))?;
        self.owned_by.validate_at(&format!("{path}.ownedBy"))?;
        if self.owned_by.reference.is_none() {
            return Err(invalid(&format!("{path}.ownedBy"), "owner reference must have a target"));
        }
        self.administered_by
            .validate_at(&format!("{path}.administeredBy"))?;
        validate_all(&self.coverage_area, &format!("{path}.coverageArea"))?;
        validate_all(&self.contact, &format!("{path}.contact"))?;
        validate_all(&self.network, &format!("{path}.network"))?;
        validate_all(&self.coverage, &format!("{path}.coverage"))?;
        validate_all(&self.plan, &format!("{path}.plan"))
    }
}

// ============================================================================
// Coverage
// ============================================================================

/// A category of coverage and the benefits it includes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Coverage {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(rename = "type")]
    pub type_: CodeableConcept,

    pub benefit: Vec<CoverageBenefit>,
}

impl Validate for Coverage {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        validate_all(&self.extension, &format!("{path}.extension"))?;
        self.type_.validate_at(&format!("{path}.type"))?;
        if self.benefit.is_empty() {
            return Err(invalid(&format!("{path}.benefit"), "coverage must list at least one benefit"));
        }
        validate_all(&self.benefit, &format!("{path}.benefit"))
    }
}

/// A specific benefit within a coverage.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoverageBenefit {
    #[serde(rename = "type")]
    pub type_: CodeableConcept,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub limit: Vec<BenefitLimit>,
}

impl Validate for CoverageBenefit {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        self.type_.validate_at(&format!("{path}.type"))?;
        validate_all(&self.limit, &format!("{path}.limit"))
    }
}

/// A maximum on a benefit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenefitLimit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Quantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
}

impl Validate for BenefitLimit {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        if self.value.is_none() && self.code.is_none() {
            return Err(invalid(path, "limit must have a value or code"));
        }
        self.value.validate_at(&format!("{path}.value"))?;
        self.code.validate_at(&format!("{path}.code"))
    }
}

// ============================================================================
// Financial plan
// ============================================================================

/// A cost-sharing plan offered under the insurance product.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialPlan {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub specific_cost: Vec<SpecificCost>,
}

impl Validate for FinancialPlan {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        validate_all(&self.identifier, &format!("{path}.identifier"))?;
        self.type_.validate_at(&format!("{path}.type"))?;
        validate_all(&self.specific_cost, &format!("{path}.specificCost"))
    }
}

/// Costs for one benefit category.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpecificCost {
    pub category: CodeableConcept,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub benefit: Vec<SpecificCostBenefit>,
}

impl Validate for SpecificCost {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        self.category.validate_at(&format!("{path}.category"))?;
        validate_all(&self.benefit, &format!("{path}.benefit"))
    }
}

/// A benefit within a specific-cost category.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpecificCostBenefit {
    #[serde(rename = "type")]
    pub type_: CodeableConcept,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cost: Vec<BenefitCost>,
}

impl Validate for SpecificCostBenefit {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        self.type_.validate_at(&format!("{path}.type"))?;
        validate_all(&self.cost, &format!("{path}.cost"))
    }
}

/// A single cost line: its type, network applicability and amount.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenefitCost {
    #[serde(rename = "type")]
    pub type_: CodeableConcept,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicability: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Quantity>,
}

impl Validate for BenefitCost {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        self.type_.validate_at(&format!("{path}.type"))?;
        self.applicability
            .validate_at(&format!("{path}.applicability"))?;
        self.value.validate_at(&format!("{path}.value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Coding;
    use crate::FhirError;
    use nhcx_types::FiniteDecimal;

    fn text(s: &str) -> CodeableConcept {
        CodeableConcept::from_text(s)
    }

    fn minimal_plan() -> InsurancePlan {
        InsurancePlan {
            id: ResourceId::new(),
            meta: Meta::with_profile("https://example.org/StructureDefinition/InsurancePlan"),
            text: None,
            language: Some("en-IN".into()),
            extension: Vec::new(),
            identifier: Vec::new(),
            status: PublicationStatus::Active,
            type_: Vec::new(),
            name: "Gold Plan".into(),
            alias: Vec::new(),
            period: None,
            owned_by: Reference::to(&ResourceId::new(), None),
            administered_by: None,
            coverage_area: Vec::new(),
            contact: Vec::new(),
            network: Vec::new(),
            coverage: Vec::new(),
            plan: Vec::new(),
        }
    }

    #[test]
    fn publication_status_parses_case_insensitively() {
        assert_eq!(PublicationStatus::from_code(" Active "), Some(PublicationStatus::Active));
        assert_eq!(PublicationStatus::from_code("RETIRED"), Some(PublicationStatus::Retired));
        assert_eq!(PublicationStatus::from_code("in force"), None);
    }

    #[test]
    fn serialises_camel_case_member_names() {
        let mut plan = minimal_plan();
        plan.coverage_area.push(Reference::display_only("India"));
        plan.validate().expect("valid plan");
        let value = serde_json::to_value(&plan).expect("serialise");
        assert!(value.get("ownedBy").is_some());
        assert_eq!(value["coverageArea"][0]["display"], "India");
        assert_eq!(value["status"], "active");
        assert!(value.get("administeredBy").is_none());
    }

    #[test]
    fn owner_without_target_is_rejected() {
        let mut plan = minimal_plan();
        plan.owned_by = Reference::display_only("Acme");
        let err = plan.validate().expect_err("owner must be targeted");
        assert!(matches!(err, FhirError::Validation { path, .. } if path == "InsurancePlan.ownedBy"));
    }

    #[test]
    fn coverage_requires_benefits() {
        let coverage = Coverage {
            extension: Vec::new(),
            type_: text("Inpatient Care"),
            benefit: Vec::new(),
        };
        let err = coverage.validate_at("coverage[0]").expect_err("no benefits");
        assert!(matches!(err, FhirError::Validation { path, .. } if path == "coverage[0].benefit"));
    }

    #[test]
    fn specific_cost_serialises_nested_cost_lines() {
        let cost = SpecificCost {
            category: text("Ambulance"),
            benefit: vec![SpecificCostBenefit {
                type_: text("Ambulance Service"),
                cost: vec![BenefitCost {
                    type_: CodeableConcept {
                        coding: vec![Coding {
                            system: Some("http://terminology.hl7.org/CodeSystem/benefit-cost-type".into()),
                            code: Some("fullcoverage".into()),
                            display: None,
                        }],
                        text: None,
                    },
                    applicability: None,
                    value: Some(Quantity {
                        value: Some(FiniteDecimal::new(2000.0).expect("finite")),
                        unit: Some("INR".into()),
                    }),
                }],
            }],
        };
        cost.validate_at("specificCost[0]").expect("valid cost");
        let value = serde_json::to_value(&cost).expect("serialise");
        assert_eq!(value["benefit"][0]["cost"][0]["value"]["value"], 2000.0);
        assert_eq!(value["benefit"][0]["cost"][0]["type"]["coding"][0]["code"], "fullcoverage");
    }
}
