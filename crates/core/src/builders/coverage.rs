use super::BuildContext;
use crate::constants::EXT_CONDITION;
use crate::diagnostics::WarningKind;
use crate::primitives::required_concept;
use crate::record::Record;
use fhir::{
    BenefitLimit, CodeableConcept, Coverage, CoverageBenefit, Extension, ExtensionValue, Quantity,
    Validate,
};
use nhcx_types::FiniteDecimal;

const CONTEXT: &str = "insurancePlan.coverages";

/// Builds plan coverages.
///
/// A coverage whose benefit list comes out empty is dropped with a warning, as is one that fails
/// validation (with an error log).
pub fn build_coverages(ctx: &mut BuildContext<'_>, records: &[Record<'_>]) -> Vec<Coverage> {
    let mut coverages = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let label = record.text("typeDisplay");
        let benefit: Vec<CoverageBenefit> = record
            .list("benefits")
            .iter()
            .map(|b| build_benefit(ctx, b))
            .collect();

        if benefit.is_empty() {
            ctx.diagnostics.warn(
                CONTEXT,
                "benefits",
                WarningKind::EmptyCoverage {
                    label: label.as_ref().map(|l| l.to_string()),
                },
            );
            continue;
        }

        let extension = record
            .text("condition")
            .map(|statement| {
                Extension::complex(
                    EXT_CONDITION,
                    vec![Extension::simple(
                        "statement",
                        ExtensionValue::String(statement.into_string()),
                    )],
                )
            })
            .into_iter()
            .collect();

        let coverage = Coverage {
            extension,
            type_: required_concept(None, label.as_ref().map(|l| l.as_str()), None, None),
            benefit,
        };

        match coverage.validate_at(&format!("{CONTEXT}[{i}]")) {
            Ok(()) => coverages.push(coverage),
            Err(e) => tracing::error!("skipping coverage that failed validation: {e}"),
        }
    }
    coverages
}

fn build_benefit(ctx: &mut BuildContext<'_>, record: &Record<'_>) -> CoverageBenefit {
    let code = record.text("typeCode");
    let display = record.text("typeDisplay");
    let type_ = ctx.terminology_concept(
        code.as_ref().map(|c| c.as_str()),
        display.as_ref().map(|d| d.as_str()),
    );

    let limit = record
        .text("limitValue")
        .map(|raw| {
            let unit = record.text("limitUnit");
            let value = FiniteDecimal::parse(raw.as_str()).unwrap_or_else(|_| {
                ctx.diagnostics.invalid_number(
                    "insurancePlan.coverages.benefits",
                    "limitValue",
                    raw.as_str(),
                    FiniteDecimal::ZERO.value(),
                );
                FiniteDecimal::ZERO
            });
            let label = match &unit {
                Some(unit) => format!("{raw} {unit}"),
                None => raw.to_string(),
            };
            BenefitLimit {
                value: Some(Quantity {
                    value: Some(value),
                    unit: unit.map(|u| u.into_string()),
                }),
                code: Some(CodeableConcept::from_text(label)),
            }
        })
        .into_iter()
        .collect();

    CoverageBenefit { type_, limit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminology::Terminology;
    use serde_json::{json, Value};

    fn records(value: &Value) -> Vec<Record<'_>> {
        value
            .as_array()
            .expect("array")
            .iter()
            .map(Record::new)
            .collect()
    }

    #[test]
    fn builds_coverage_with_limit_and_condition() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!([{
            "typeDisplay": "Inpatient Care",
            "condition": "Subject to sum insured",
            "benefits": [{"typeCode": "", "typeDisplay": "Room Rent", "limitValue": "5000", "limitUnit": "INR"}]
        }]);
        let coverages = build_coverages(&mut ctx, &records(&value));
        assert_eq!(coverages.len(), 1);

        let doc = serde_json::to_value(&coverages[0]).expect("serialise");
        assert_eq!(doc["type"], json!({"text": "Inpatient Care"}));
        assert_eq!(doc["extension"][0]["url"], EXT_CONDITION);
        assert_eq!(doc["extension"][0]["extension"][0]["valueString"], "Subject to sum insured");
        assert_eq!(doc["benefit"][0]["type"], json!({"text": "Room Rent"}));
        assert_eq!(doc["benefit"][0]["limit"][0]["value"], json!({"value": 5000.0, "unit": "INR"}));
        assert_eq!(doc["benefit"][0]["limit"][0]["code"], json!({"text": "5000 INR"}));
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn unparseable_limit_defaults_to_zero_and_keeps_benefit() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!([{
            "typeDisplay": "Daycare",
            "benefits": [{"typeDisplay": "Cataract", "limitValue": "abc"}]
        }]);
        let coverages = build_coverages(&mut ctx, &records(&value));
        assert_eq!(coverages.len(), 1);
        let limit = &coverages[0].benefit[0].limit[0];
        assert_eq!(
            limit.value.as_ref().and_then(|q| q.value),
            Some(FiniteDecimal::ZERO)
        );
        assert_eq!(ctx.diagnostics.len(), 1);
        assert!(matches!(
            ctx.diagnostics.warnings()[0].kind,
            WarningKind::InvalidNumber { .. }
        ));
    }

    #[test]
    fn numeric_limit_value_is_accepted() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!([{"typeDisplay": "OPD", "benefits": [{"typeDisplay": "Consult", "limitValue": 1500}]}]);
        let coverages = build_coverages(&mut ctx, &records(&value));
        let limit = &coverages[0].benefit[0].limit[0];
        assert_eq!(limit.value.as_ref().and_then(|q| q.value).map(FiniteDecimal::value), Some(1500.0));
        assert_eq!(limit.code, Some(CodeableConcept::from_text("1500")));
    }

    #[test]
    fn coverage_without_benefits_is_dropped_with_warning() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!([{"typeDisplay": "Maternity", "benefits": []}, {"typeDisplay": "OPD"}]);
        assert!(build_coverages(&mut ctx, &records(&value)).is_empty());
        assert_eq!(ctx.diagnostics.len(), 2);
        let warnings = ctx.diagnostics.warnings();
        assert_eq!(warnings[0].field, "benefits");
        assert_eq!(
            warnings[0].kind,
            WarningKind::EmptyCoverage {
                label: Some("Maternity".into())
            }
        );
        assert_eq!(warnings[1].kind, WarningKind::EmptyCoverage { label: None });
    }

    #[test]
    fn snomed_benefit_codes_are_resolved() {
        let t = Terminology::from_tables(
            [("49122002".to_string(), "Ambulance".to_string())],
            [("ambulance cover".to_string(), "49122002".to_string())],
        );
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!([{"typeDisplay": "Emergency", "benefits": [{"typeDisplay": "Ambulance Cover"}]}]);
        let coverages = build_coverages(&mut ctx, &records(&value));
        let benefit_type = &coverages[0].benefit[0].type_;
        assert_eq!(benefit_type.first_code(), Some("49122002"));
        assert_eq!(benefit_type.coding[0].display.as_deref(), Some("Ambulance"));
    }
}
