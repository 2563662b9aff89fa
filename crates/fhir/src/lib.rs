//! FHIR R4 wire models for insurance-plan bundles.
//!
//! This crate provides **wire models** and **structural validation** for the resources carried in
//! an insurance-plan bundle:
//! - `Organization` (insurer, third-party administrator, provider networks)
//! - `InsurancePlan` with its coverage and financial-plan backbone elements
//! - `Bundle` of type `collection`
//!
//! This crate focuses on:
//! - FHIR JSON shape (member names, omission of absent values)
//! - element-level validation with a path to the offending element
//!
//! Mapping from an extracted record to these structs lives in `nhcx-core`; this crate has no
//! knowledge of terminology or record layouts.

pub mod bundle;
pub mod datatypes;
pub mod insurance_plan;
pub mod organization;
pub mod validation;

// Re-export resources
pub use bundle::{Bundle, BundleEntry, BundleType, Resource};
pub use insurance_plan::{
    BenefitCost, BenefitLimit, Coverage, CoverageBenefit, FinancialPlan, InsurancePlan,
    PublicationStatus, SpecificCost, SpecificCostBenefit,
};
pub use organization::Organization;

// Re-export datatypes
pub use datatypes::{
    CodeableConcept, Coding, ContactDetail, ContactPoint, ContactPointSystem, Extension,
    ExtensionValue, HumanName, Identifier, IdentifierUse, Meta, Narrative, NarrativeStatus,
    Period, Quantity, Reference,
};
pub use validation::Validate;

// Re-export ResourceId from nhcx_uuid crate
pub use nhcx_uuid::ResourceId;

/// Errors returned by the `fhir` wire crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("{path}: {message}")]
    Validation { path: String, message: String },
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
