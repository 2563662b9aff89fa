//! Mapping facade: one extracted record in, one bundle document out.
//!
//! The mapper walks a fixed sequence of states:
//!
//! ```text
//! Init → OrgsBuilt → NetworksBuilt → PlanBuilt → Assembled → Done
//!                                  ↘ Aborted (no owner organization)
//!                                  ↘ PlanRejected (plan failed validation)
//! ```
//!
//! An empty `insurancePlan` record skips `PlanBuilt` and goes straight to `Assembled`. A missing
//! owner or a rejected plan ends the walk early, and even then a document holding the
//! organizations that were built is returned. Everything else degrades locally inside the
//! builders.

use crate::assembler::to_document;
use crate::builders::{
    build_insurance_plan, build_networks, build_organization, BuildContext, OrganizationRole,
};
use crate::config::CoreConfig;
use crate::constants::DEFAULT_LANGUAGE;
use crate::diagnostics::{Diagnostics, Warning, WarningKind};
use crate::record::Record;
use crate::terminology::{self, Terminology};
use crate::CoreResult;
use fhir::Bundle;
use nhcx_uuid::ResourceId;
use serde::Serialize;
use serde_json::{json, Value};

/// Progress of one mapping call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MapperState {
    Init,
    OrgsBuilt,
    NetworksBuilt,
    PlanBuilt,
    Assembled,
    Done,
    /// No owner organization could be built, so no InsurancePlan was attempted.
    Aborted,
    /// The InsurancePlan was built but failed validation, so the bundle holds only organizations.
    PlanRejected,
}

impl MapperState {
    /// True for the states that end the walk before `Assembled`.
    pub fn is_halted(self) -> bool {
        matches!(self, Self::Aborted | Self::PlanRejected)
    }
}

/// Outcome of a mapping call: the document plus how it was produced.
#[derive(Clone, Debug, Serialize)]
pub struct MappingReport {
    pub document: Value,
    pub state: MapperState,
    pub warnings: Vec<Warning>,
}

/// Maps extracted insurance-plan records to bundle documents.
///
/// Holds only read-only state, so one mapper can serve concurrent calls.
#[derive(Clone, Debug)]
pub struct InsurancePlanMapper<'a> {
    terminology: &'a Terminology,
    language: String,
}

impl<'a> InsurancePlanMapper<'a> {
    pub fn new(terminology: &'a Terminology, config: &CoreConfig) -> Self {
        Self {
            terminology,
            language: config.default_language().to_string(),
        }
    }

    pub fn with_language(terminology: &'a Terminology, language: &str) -> Self {
        Self {
            terminology,
            language: language.to_string(),
        }
    }

    /// Maps `record` to a bundle document.
    pub fn generate(&self, record: &Value) -> Value {
        self.generate_report(record).document
    }

    /// Maps `record` and reports the final state and data-quality warnings alongside the document.
    pub fn generate_report(&self, record: &Value) -> MappingReport {
        let record = Record::new(record);
        let mut ctx = BuildContext::new(self.terminology, &self.language);
        let mut state = MapperState::Init;

        let owner = build_organization(
            &mut ctx,
            record.first_record(&["organisation", "organization"]),
            OrganizationRole::Insurer,
        );
        let administrator = build_organization(
            &mut ctx,
            record.first_record(&["tpaOrganisation", "tpaOrganization"]),
            OrganizationRole::Tpa,
        );
        advance(&mut state, MapperState::OrgsBuilt);

        let plan_record = record.record("insurancePlan");
        let networks = build_networks(&mut ctx, &plan_record.string_list("networks"));
        advance(&mut state, MapperState::NetworksBuilt);

        match owner {
            Some(owner) => {
                let built =
                    build_insurance_plan(&mut ctx, plan_record, owner, administrator, networks);
                let next = after_plan(built, &mut ctx.diagnostics);
                if next != state {
                    advance(&mut state, next);
                }
            }
            None => {
                tracing::error!("no owner organization could be built; skipping InsurancePlan");
                advance(&mut state, MapperState::Aborted);
            }
        }

        let BuildContext {
            diagnostics,
            assembler,
            ..
        } = ctx;
        let bundle = assembler.finish();
        if let Err(e) = bundle.validate() {
            tracing::error!("assembled bundle failed validation: {e}");
        }
        if !state.is_halted() {
            advance(&mut state, MapperState::Assembled);
        }

        let document = match to_document(&bundle) {
            Ok(document) => document,
            Err(e) => {
                tracing::error!("{e}; returning an empty bundle");
                shell_document(&bundle)
            }
        };
        if !state.is_halted() {
            advance(&mut state, MapperState::Done);
        }

        MappingReport {
            document,
            state,
            warnings: diagnostics.into_warnings(),
        }
    }
}

fn advance(state: &mut MapperState, next: MapperState) {
    tracing::debug!(from = ?*state, to = ?next, "mapper state");
    *state = next;
}

/// State after the InsurancePlan step. An empty plan record leaves the state where it was; a
/// rejected plan is recorded as a warning.
fn after_plan(built: CoreResult<Option<ResourceId>>, diagnostics: &mut Diagnostics) -> MapperState {
    match built {
        Ok(Some(_)) => MapperState::PlanBuilt,
        Ok(None) => MapperState::NetworksBuilt,
        Err(e) => {
            tracing::error!("InsurancePlan failed validation: {e}");
            diagnostics.warn(
                "insurancePlan",
                "insurancePlan",
                WarningKind::PlanRejected {
                    reason: e.to_string(),
                },
            );
            MapperState::PlanRejected
        }
    }
}

/// The bundle's own fields with no entries, for when the full document cannot be produced.
fn shell_document(bundle: &Bundle) -> Value {
    let shell = Bundle {
        entry: Vec::new(),
        meta: bundle.meta.clone(),
        identifier: bundle.identifier.clone(),
        language: bundle.language.clone(),
        ..*bundle
    };
    serde_json::to_value(&shell).unwrap_or_else(|e| {
        tracing::error!("{e}; returning a minimal bundle");
        json!({
            "resourceType": Bundle::RESOURCE_TYPE,
            "id": bundle.id.to_string(),
            "type": "collection",
            "language": bundle.language,
            "entry": []
        })
    })
}

/// Maps `record` with the process-wide terminology dictionary and the default language.
pub fn generate(record: &Value) -> Value {
    InsurancePlanMapper::with_language(terminology::global(), DEFAULT_LANGUAGE).generate(record)
}
