//! # NHCX Core
//!
//! Mapping logic for NHCX insurance-plan bundles.
//!
//! This crate turns one extracted insurance-plan record (loose JSON) into a FHIR R4 `collection`
//! Bundle holding an InsurancePlan and its Organizations:
//! - Terminology lookup against a SNOMED-style dictionary loaded once per process
//! - Builders for organizations, contacts, coverages and financial plans
//! - Bundle assembly with `urn:uuid:` references and plan-first ordering
//! - Validation and summaries of finished bundle documents
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and `cli`.

pub mod assembler;
pub mod builders;
pub mod config;
pub mod constants;
pub mod diagnostics;
mod error;
pub mod inspect;
pub mod mapper;
pub mod primitives;
pub mod record;
pub mod terminology;

pub use config::CoreConfig;
pub use diagnostics::{Warning, WarningKind};
pub use error::{CoreError, CoreResult};
pub use inspect::{
    summarize_bundle, validate_bundle, BundleSummary, Severity, ValidationIssue, ValidationReport,
};
pub use mapper::{generate, InsurancePlanMapper, MapperState, MappingReport};
pub use terminology::{Resolved, Terminology};
