//! Constants used throughout the NHCX core crate.
//!
//! This module holds every fixed URI, code and literal the mapper writes into a bundle, so that
//! profile and terminology changes are made in one place.

// ============================================================================
// Profiles
// ============================================================================

/// Profile asserted on every Organization resource.
pub const PROFILE_ORGANIZATION: &str =
    "https://nrces.in/ndhm/fhir/r4/StructureDefinition/Organization";

/// Profile asserted on the InsurancePlan resource.
pub const PROFILE_INSURANCE_PLAN: &str =
    "https://nrces.in/ndhm/fhir/r4/StructureDefinition/InsurancePlan";

/// Profile asserted on the bundle itself.
pub const PROFILE_INSURANCE_PLAN_BUNDLE: &str =
    "https://nrces.in/ndhm/fhir/r4/StructureDefinition/InsurancePlanBundle";

// ============================================================================
// Identifier systems
// ============================================================================

/// Identifier system for the owning insurer.
pub const SYS_INSURER_IDENTIFIER: &str = "https://irdai.gov.in/insurer";

/// Identifier system for third-party administrators (IRDAI registration numbers).
pub const SYS_TPA_IDENTIFIER: &str = "https://irdai.gov.in/tpa";

/// Identifier system for provider-network organizations.
pub const SYS_NETWORK_IDENTIFIER: &str = "https://nrces.in/ndhm/fhir/r4/provider-network";

/// RFC 3986 identifier system, used for `urn:uuid:` business identifiers.
pub const SYS_URN_IDENTIFIER: &str = "urn:ietf:rfc:3986";

// ============================================================================
// Code systems
// ============================================================================

/// SNOMED CT, used for purely numeric resolved codes.
pub const SYS_SNOMED: &str = "http://snomed.info/sct";

/// Null-flavor system used when a mandatory concept has no code.
pub const SYS_NULL_FLAVOR: &str = "http://terminology.hl7.org/CodeSystem/v3-NullFlavor";

pub const SYS_CONTACT_ENTITY_TYPE: &str =
    "http://terminology.hl7.org/CodeSystem/contactentity-type";

pub const SYS_ORGANIZATION_TYPE: &str = "http://terminology.hl7.org/CodeSystem/organization-type";

pub const SYS_BENEFIT_COST_TYPE: &str = "http://terminology.hl7.org/CodeSystem/benefit-cost-type";

pub const SYS_APPLICABILITY: &str = "http://terminology.hl7.org/CodeSystem/applicability";

/// Financial plan type (individual, family floater, ...).
pub const SYS_PLAN_TYPE: &str = "https://nrces.in/ndhm/fhir/r4/CodeSystem/ndhm-plan-type";

/// InsurancePlan product type.
pub const SYS_INSURANCE_PLAN_TYPE: &str =
    "https://nrces.in/ndhm/fhir/r4/CodeSystem/ndhm-insuranceplan-type";

// ============================================================================
// Extensions
// ============================================================================

pub const EXT_SUPPORTING_INFO_REQUIREMENT: &str =
    "https://nrces.in/ndhm/fhir/r4/StructureDefinition/Claim-SupportingInfoRequirement";

pub const EXT_EXCLUSION: &str = "https://nrces.in/ndhm/fhir/r4/StructureDefinition/Exclusion";

pub const EXT_CONDITION: &str = "https://nrces.in/ndhm/fhir/r4/StructureDefinition/Condition";

// ============================================================================
// Fixed codes and literals
// ============================================================================

/// Code and display of the explicit unknown coding.
pub const UNKNOWN_CODE: &str = "unknown";
pub const UNKNOWN_DISPLAY: &str = "Unknown";

/// Placeholder for a required name that was not extracted.
pub const NAME_FALLBACK: &str = "Unknown";

/// Sentinel for a required specific-cost field that was not extracted.
pub const COST_FIELD_SENTINEL: &str = "UNK";

pub const CONTACT_PURPOSE_CODE: &str = "PAYOR";
pub const CONTACT_PURPOSE_DISPLAY: &str = "Payor";

pub const NETWORK_TYPE_CODE: &str = "prov";
pub const NETWORK_TYPE_DISPLAY: &str = "Healthcare Provider Network";

pub const APPLICABILITY_IN_NETWORK: &str = "in-network";
pub const APPLICABILITY_OUT_OF_NETWORK: &str = "out-of-network";
pub const APPLICABILITY_OTHER: &str = "other";

// ============================================================================
// Configuration defaults
// ============================================================================

/// Language tag used when neither the record nor the configuration supplies one.
pub const DEFAULT_LANGUAGE: &str = "en-IN";

/// Relative location of the terminology dictionary.
pub const TERMINOLOGY_DICTIONARY_PATH: &str = "data/snomed_dictionary.json";
