use super::{build_contacts, build_coverages, build_financial_plans, BuildContext};
use crate::constants::{
    EXT_EXCLUSION, EXT_SUPPORTING_INFO_REQUIREMENT, NAME_FALLBACK, PROFILE_INSURANCE_PLAN,
    SYS_INSURANCE_PLAN_TYPE, SYS_URN_IDENTIFIER,
};
use crate::diagnostics::WarningKind;
use crate::primitives::{narrative, required_concept};
use crate::record::Record;
use crate::CoreResult;
use fhir::validation::check_language_tag;
use fhir::{
    Extension, ExtensionValue, Identifier, InsurancePlan, Meta, Period, PublicationStatus,
    Reference, Validate,
};
use nhcx_types::NonEmptyText;
use nhcx_uuid::ResourceId;

const CONTEXT: &str = "insurancePlan";

/// Builds the InsurancePlan and adds it to the bundle.
///
/// `owner` must already reference an entry in the bundle. Returns `Ok(None)` when the record is
/// empty, and an error when the finished plan fails validation; nothing is added in either case.
pub fn build_insurance_plan(
    ctx: &mut BuildContext<'_>,
    record: Record<'_>,
    owner: Reference,
    administrator: Option<Reference>,
    networks: Vec<Reference>,
) -> CoreResult<Option<ResourceId>> {
    if record.is_empty() {
        tracing::debug!("no insurancePlan data; skipping plan");
        return Ok(None);
    }

    let name = match record.text("name") {
        Some(name) => name.into_string(),
        None => {
            ctx.diagnostics
                .missing_required(CONTEXT, "name", NAME_FALLBACK);
            NAME_FALLBACK.to_string()
        }
    };
    let status = plan_status(ctx, &record);
    let language = plan_language(ctx, &record);

    let resolved = ctx.terminology.resolve(
        record.text("typeCode").as_ref().map(NonEmptyText::as_str),
        record.text("typeDisplay").as_ref().map(NonEmptyText::as_str),
    );
    let type_ = required_concept(
        resolved.code.as_deref(),
        resolved.display.as_deref(),
        resolved.code.as_ref().map(|_| SYS_INSURANCE_PLAN_TYPE),
        None,
    );

    let contacts = build_contacts(&record.list("contacts"));
    let coverage = build_coverages(ctx, &record.list("coverages"));
    let plan = build_financial_plans(ctx, &record.list("plans"));

    let id = ctx.assembler.allocate_id();
    let insurance_plan = InsurancePlan {
        id,
        meta: Meta::with_profile(PROFILE_INSURANCE_PLAN),
        text: Some(narrative(&format!(
            "Insurance Plan: {name}. Status: {}.",
            status.as_code()
        ))),
        language: Some(language),
        extension: plan_extensions(&record),
        identifier: vec![Identifier::official(
            SYS_URN_IDENTIFIER,
            ctx.assembler.allocate_urn(),
        )],
        status,
        type_: vec![type_],
        name,
        alias: record
            .string_list("alias")
            .into_iter()
            .map(NonEmptyText::into_string)
            .collect(),
        period: plan_period(ctx, &record),
        owned_by: owner,
        administered_by: administrator,
        coverage_area: record
            .string_list("coverageArea")
            .into_iter()
            .map(Reference::display_only)
            .collect(),
        contact: contacts,
        network: networks,
        coverage,
        plan,
    };

    insurance_plan.validate()?;
    Ok(Some(ctx.assembler.add_entry(insurance_plan.into())))
}

/// Plan status, defaulting to `active`. Unrecognised text becomes `unknown` with a warning.
fn plan_status(ctx: &mut BuildContext<'_>, record: &Record<'_>) -> PublicationStatus {
    let Some(raw) = record.text("status") else {
        return PublicationStatus::Active;
    };
    PublicationStatus::from_code(raw.as_str()).unwrap_or_else(|| {
        ctx.diagnostics.warn(
            CONTEXT,
            "status",
            WarningKind::InvalidStatus {
                value: raw.to_string(),
                fallback: PublicationStatus::Unknown.as_code().to_string(),
            },
        );
        PublicationStatus::Unknown
    })
}

fn plan_language(ctx: &BuildContext<'_>, record: &Record<'_>) -> String {
    match record.text("language") {
        Some(language) if check_language_tag("language", language.as_str()).is_ok() => {
            language.into_string()
        }
        Some(language) => {
            tracing::warn!(
                "plan language '{language}' is not a language tag; using {}",
                ctx.language
            );
            ctx.language.to_string()
        }
        None => ctx.language.to_string(),
    }
}

/// Period from `periodStart`/`periodEnd`. A malformed bound drops the whole period.
fn plan_period(ctx: &mut BuildContext<'_>, record: &Record<'_>) -> Option<Period> {
    let period = Period {
        start: record.text("periodStart").map(NonEmptyText::into_string),
        end: record.text("periodEnd").map(NonEmptyText::into_string),
    };
    if period.start.is_none() && period.end.is_none() {
        return None;
    }
    if let Err(e) = period.validate_at("period") {
        let field = match &e {
            fhir::FhirError::Validation { path, .. } if path.ends_with(".end") => "periodEnd",
            _ => "periodStart",
        };
        let value = match field {
            "periodEnd" => period.end.clone(),
            _ => period.start.clone(),
        }
        .unwrap_or_default();
        ctx.diagnostics
            .warn(CONTEXT, field, WarningKind::InvalidDate { value });
        return None;
    }
    Some(period)
}

fn plan_extensions(record: &Record<'_>) -> Vec<Extension> {
    let coded = |url: &str, entry: &Record<'_>, code_key: &str, display_key: &str| {
        Extension::simple(
            url,
            ExtensionValue::CodeableConcept(required_concept(
                entry.text(code_key).as_ref().map(NonEmptyText::as_str),
                entry.text(display_key).as_ref().map(NonEmptyText::as_str),
                None,
                None,
            )),
        )
    };

    let requirements = record.list("supportingInfoRequirements").into_iter().map(|req| {
        Extension::complex(
            EXT_SUPPORTING_INFO_REQUIREMENT,
            vec![
                coded("category", &req, "categoryCode", "categoryDisplay"),
                coded("document", &req, "documentCode", "documentDisplay"),
            ],
        )
    });

    let exclusions = record.list("exclusions").into_iter().map(|excl| {
        let mut parts = vec![coded("category", &excl, "categoryCode", "categoryDisplay")];
        if let Some(statement) = excl.text("statement") {
            parts.push(Extension::simple(
                "statement",
                ExtensionValue::String(statement.into_string()),
            ));
        }
        Extension::complex(EXT_EXCLUSION, parts)
    });

    requirements.chain(exclusions).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{SYS_NULL_FLAVOR, UNKNOWN_CODE};
    use crate::terminology::Terminology;
    use fhir::Resource;
    use serde_json::{json, Value};

    fn build(ctx: &mut BuildContext<'_>, value: &Value) -> Option<InsurancePlan> {
        let owner = ctx.assembler.allocate_id();
        ctx.assembler.add_entry(
            fhir::Organization {
                id: owner,
                meta: Meta::with_profile("https://example.org/Organization"),
                text: None,
                identifier: Vec::new(),
                type_: Vec::new(),
                name: "Acme".into(),
                contact: Vec::new(),
            }
            .into(),
        );
        let owner_ref = ctx.assembler.reference_to(&owner, Some("Acme".into()))?;
        let id = build_insurance_plan(ctx, Record::new(value), owner_ref, None, Vec::new())
            .expect("plan validates")?;
        ctx.assembler.entries().iter().find_map(|e| match e.resource() {
            Resource::InsurancePlan(plan) if plan.id == id => Some(plan.clone()),
            _ => None,
        })
    }

    #[test]
    fn builds_plan_fields() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!({
            "name": "Gold Plan",
            "status": "Active",
            "alias": ["Gold", ""],
            "typeCode": "01",
            "typeDisplay": "Hospitalisation Indemnity",
            "periodStart": "2024-04-01",
            "periodEnd": "2025-03-31",
            "coverageArea": ["India"],
            "supportingInfoRequirements": [{
                "categoryCode": "POI", "categoryDisplay": "Proof of Identity",
                "documentCode": "ADN", "documentDisplay": "Aadhaar Card"
            }],
            "exclusions": [{"categoryDisplay": "Pre-Existing Diseases", "statement": "Excluded for 48 months."}]
        });
        let plan = build(&mut ctx, &value).expect("plan");
        assert_eq!(plan.name, "Gold Plan");
        assert_eq!(plan.status, PublicationStatus::Active);
        assert_eq!(plan.language.as_deref(), Some("en-IN"));
        assert_eq!(plan.alias, vec!["Gold".to_string()]);
        assert_eq!(plan.type_[0].coding[0].system.as_deref(), Some(SYS_INSURANCE_PLAN_TYPE));
        assert_eq!(
            plan.period,
            Some(Period {
                start: Some("2024-04-01".into()),
                end: Some("2025-03-31".into())
            })
        );
        assert_eq!(plan.coverage_area, vec![Reference::display_only("India")]);
        assert_eq!(plan.identifier[0].system.as_deref(), Some(SYS_URN_IDENTIFIER));

        let doc = serde_json::to_value(&plan).expect("serialise");
        assert_eq!(doc["extension"][0]["url"], EXT_SUPPORTING_INFO_REQUIREMENT);
        assert_eq!(doc["extension"][0]["extension"][1]["url"], "document");
        assert_eq!(
            doc["extension"][0]["extension"][1]["valueCodeableConcept"]["coding"][0]["code"],
            "ADN"
        );
        assert_eq!(doc["extension"][1]["url"], EXT_EXCLUSION);
        assert_eq!(
            doc["extension"][1]["extension"][0]["valueCodeableConcept"],
            json!({"text": "Pre-Existing Diseases"})
        );
        assert_eq!(doc["extension"][1]["extension"][1]["valueString"], "Excluded for 48 months.");
        assert!(plan
            .text
            .as_ref()
            .expect("narrative")
            .div
            .contains("Insurance Plan: Gold Plan. Status: active."));
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn empty_record_builds_nothing() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        assert!(build(&mut ctx, &json!({})).is_none());
    }

    #[test]
    fn defaults_for_missing_name_status_and_type() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-GB");
        let plan = build(&mut ctx, &json!({"alias": ["X"]})).expect("plan");
        assert_eq!(plan.name, "Unknown");
        assert_eq!(plan.status, PublicationStatus::Active);
        assert_eq!(plan.language.as_deref(), Some("en-GB"));
        assert_eq!(plan.type_[0].coding[0].system.as_deref(), Some(SYS_NULL_FLAVOR));
        assert_eq!(plan.type_[0].first_code(), Some(UNKNOWN_CODE));
        assert_eq!(ctx.diagnostics.len(), 1);
    }

    #[test]
    fn unrecognised_status_becomes_unknown() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let plan = build(&mut ctx, &json!({"name": "P", "status": "in force"})).expect("plan");
        assert_eq!(plan.status, PublicationStatus::Unknown);
        assert!(matches!(
            ctx.diagnostics.warnings()[0].kind,
            WarningKind::InvalidStatus { .. }
        ));
    }

    #[test]
    fn invalid_period_is_dropped_with_warning() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!({"name": "P", "periodStart": "2024-04-01", "periodEnd": "31 March 2025"});
        let plan = build(&mut ctx, &value).expect("plan");
        assert!(plan.period.is_none());
        let warning = &ctx.diagnostics.warnings()[0];
        assert_eq!(warning.field, "periodEnd");
        assert_eq!(
            warning.kind,
            WarningKind::InvalidDate {
                value: "31 March 2025".into()
            }
        );
    }

    #[test]
    fn malformed_language_falls_back_to_default() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        for language in ["en  IN", "English", "en IN", "en_IN"] {
            let plan = build(&mut ctx, &json!({"name": "P", "language": language})).expect("plan");
            assert_eq!(plan.language.as_deref(), Some("en-IN"), "{language}");
        }
        let plan = build(&mut ctx, &json!({"name": "P", "language": "hi-IN"})).expect("plan");
        assert_eq!(plan.language.as_deref(), Some("hi-IN"));
    }

    #[test]
    fn irregular_code_spacing_keeps_the_plan() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!({
            "name": "P",
            "typeCode": "01  A",
            "exclusions": [{"categoryCode": "Excl  01", "categoryDisplay": "Pre-Existing Diseases"}]
        });
        let plan = build(&mut ctx, &value).expect("plan");
        assert_eq!(plan.type_[0].first_code(), Some("01 A"));
        let doc = serde_json::to_value(&plan).expect("serialise");
        assert_eq!(
            doc["extension"][0]["extension"][0]["valueCodeableConcept"]["coding"][0]["code"],
            "Excl 01"
        );
    }

    #[test]
    fn invalid_plan_is_reported_and_not_added() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let owner_ref = Reference::display_only("Acme");
        let err = build_insurance_plan(
            &mut ctx,
            Record::new(&json!({"name": "P"})),
            owner_ref,
            None,
            Vec::new(),
        )
        .expect_err("owner without a reference target");
        assert!(matches!(err, crate::CoreError::Fhir(_)));
        assert!(ctx.assembler.entries().is_empty());
    }
}
