//! Data-quality warnings raised while mapping a record.
//!
//! A warning marks a place where the record was incomplete or malformed and a documented default
//! was written instead. Every warning is logged through `tracing` as it is recorded and is also
//! returned to the caller in the mapping report.

use serde::Serialize;
use std::fmt;

/// What was wrong with the input.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WarningKind {
    /// A required value was absent; `fallback` was written instead.
    MissingRequired { fallback: String },
    /// A value could not be read as a finite decimal; `fallback` was written instead.
    InvalidNumber { value: String, fallback: f64 },
    /// A date was not a FHIR date or dateTime; the element holding it was dropped.
    InvalidDate { value: String },
    /// A status was not a publication status code; `fallback` was written instead.
    InvalidStatus { value: String, fallback: String },
    /// A coverage yielded no benefits and was dropped. `label` is its `typeDisplay`, when given.
    EmptyCoverage {
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// The assembled InsurancePlan failed validation and was left out of the bundle.
    PlanRejected { reason: String },
}

/// One data-quality warning.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Warning {
    /// Where in the record the problem was found, e.g. `specificCost.cost`.
    pub context: String,
    pub field: String,
    #[serde(flatten)]
    pub kind: WarningKind,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::MissingRequired { fallback } => write!(
                f,
                "missing required field '{}' in {}; using '{fallback}'",
                self.field, self.context
            ),
            WarningKind::InvalidNumber { value, fallback } => write!(
                f,
                "could not parse '{value}' as a number for '{}' in {}; using {fallback:.1}",
                self.field, self.context
            ),
            WarningKind::InvalidDate { value } => write!(
                f,
                "'{value}' is not a valid date for '{}' in {}; dropping it",
                self.field, self.context
            ),
            WarningKind::InvalidStatus { value, fallback } => write!(
                f,
                "'{value}' is not a publication status for '{}' in {}; using '{fallback}'",
                self.field, self.context
            ),
            WarningKind::EmptyCoverage { label: Some(label) } => write!(
                f,
                "coverage '{label}' in {} has no {}; dropping it",
                self.context, self.field
            ),
            WarningKind::EmptyCoverage { label: None } => write!(
                f,
                "unnamed coverage in {} has no {}; dropping it",
                self.context, self.field
            ),
            WarningKind::PlanRejected { reason } => write!(
                f,
                "{} failed validation ({reason}); leaving it out of the bundle",
                self.context
            ),
        }
    }
}

/// Collects warnings for one mapping call.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and logs it.
    pub fn warn(&mut self, context: &str, field: &str, kind: WarningKind) {
        let warning = Warning {
            context: context.to_string(),
            field: field.to_string(),
            kind,
        };
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn missing_required(&mut self, context: &str, field: &str, fallback: &str) {
        self.warn(
            context,
            field,
            WarningKind::MissingRequired {
                fallback: fallback.to_string(),
            },
        );
    }

    pub fn invalid_number(&mut self, context: &str, field: &str, value: &str, fallback: f64) {
        self.warn(
            context,
            field,
            WarningKind::InvalidNumber {
                value: value.to_string(),
                fallback,
            },
        );
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
