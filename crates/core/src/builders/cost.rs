use super::BuildContext;
use crate::constants::{
    APPLICABILITY_IN_NETWORK, APPLICABILITY_OTHER, APPLICABILITY_OUT_OF_NETWORK,
    COST_FIELD_SENTINEL, SYS_APPLICABILITY, SYS_BENEFIT_COST_TYPE, SYS_PLAN_TYPE,
    SYS_URN_IDENTIFIER,
};
use crate::primitives::{concept, required_concept};
use crate::record::Record;
use fhir::{
    BenefitCost, FhirResult, FinancialPlan, Identifier, Quantity, SpecificCost,
    SpecificCostBenefit, Validate,
};
use nhcx_types::{FiniteDecimal, NonEmptyText};

const PLAN_CONTEXT: &str = "insurancePlan.plans";
const COST_CONTEXT: &str = "specificCost.cost";

/// Network applicability of a cost type. Matching ignores case.
///
/// `copay`, `deductible` and `fullcoverage` apply in network, `out-of-network` applies out of
/// network, and everything else is `other`.
pub fn applicability_for(cost_type: &str) -> &'static str {
    match cost_type.trim().to_ascii_lowercase().as_str() {
        "copay" | "deductible" | "fullcoverage" => APPLICABILITY_IN_NETWORK,
        "out-of-network" => APPLICABILITY_OUT_OF_NETWORK,
        _ => APPLICABILITY_OTHER,
    }
}

/// Title-cased display for an applicability code, e.g. `In Network`.
pub fn applicability_display(code: &str) -> String {
    code.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the plan's financial plans.
///
/// A specific-cost block that fails validation is skipped on its own; a plan that fails
/// validation is omitted.
pub fn build_financial_plans(
    ctx: &mut BuildContext<'_>,
    records: &[Record<'_>],
) -> Vec<FinancialPlan> {
    let mut plans = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let resolved = ctx.terminology.resolve(
            record.text("planTypeCode").as_ref().map(NonEmptyText::as_str),
            record.text("planTypeDisplay").as_ref().map(NonEmptyText::as_str),
        );
        let type_ = concept(
            resolved.code.as_deref(),
            resolved.display.as_deref(),
            resolved.code.as_ref().map(|_| SYS_PLAN_TYPE),
            None,
        );

        let mut specific_cost = Vec::new();
        for (j, cost_record) in record.list("specificCosts").iter().enumerate() {
            match build_specific_cost(ctx, cost_record) {
                Ok(cost) => specific_cost.push(cost),
                Err(e) => tracing::warn!(
                    block = j,
                    "skipping specific cost block that failed validation: {e}"
                ),
            }
        }

        let plan = FinancialPlan {
            identifier: vec![Identifier::official(
                SYS_URN_IDENTIFIER,
                ctx.assembler.allocate_urn(),
            )],
            type_,
            specific_cost,
        };

        match plan.validate_at(&format!("{PLAN_CONTEXT}[{i}]")) {
            Ok(()) => plans.push(plan),
            Err(e) => tracing::error!("skipping financial plan that failed validation: {e}"),
        }
    }
    plans
}

/// Reads a required cost field, substituting the sentinel with one warning when it is absent.
fn required_field(ctx: &mut BuildContext<'_>, record: &Record<'_>, field: &str) -> Option<String> {
    match record.text(field) {
        Some(value) => Some(value.into_string()),
        None => {
            ctx.diagnostics
                .missing_required(COST_CONTEXT, field, COST_FIELD_SENTINEL);
            None
        }
    }
}

fn build_specific_cost(ctx: &mut BuildContext<'_>, record: &Record<'_>) -> FhirResult<SpecificCost> {
    // A missing value is already reported by `required_field`; only malformed text is parsed.
    let value = match required_field(ctx, record, "costValue") {
        Some(raw) => FiniteDecimal::parse(&raw).unwrap_or_else(|_| {
            ctx.diagnostics.invalid_number(
                COST_CONTEXT,
                "costValue",
                &raw,
                FiniteDecimal::ZERO.value(),
            );
            FiniteDecimal::ZERO
        }),
        None => FiniteDecimal::ZERO,
    };
    let cost_type = required_field(ctx, record, "costType")
        .unwrap_or_else(|| COST_FIELD_SENTINEL.to_string());
    let unit = required_field(ctx, record, "costUnit")
        .unwrap_or_else(|| COST_FIELD_SENTINEL.to_string());

    let applicability = applicability_for(&cost_type);
    let applicability_label = applicability_display(applicability);
    let cost = BenefitCost {
        type_: required_concept(
            Some(cost_type.as_str()),
            None,
            Some(SYS_BENEFIT_COST_TYPE),
            None,
        ),
        applicability: concept(
            Some(applicability),
            Some(applicability_label.as_str()),
            Some(SYS_APPLICABILITY),
            None,
        ),
        value: Some(Quantity {
            value: Some(value),
            unit: Some(unit),
        }),
    };

    let benefit = SpecificCostBenefit {
        type_: ctx.terminology_concept(
            record.text("benefitTypeCode").as_ref().map(NonEmptyText::as_str),
            record.text("benefitTypeDisplay").as_ref().map(NonEmptyText::as_str),
        ),
        cost: vec![cost],
    };

    let specific_cost = SpecificCost {
        category: ctx.terminology_concept(
            record.text("categoryCode").as_ref().map(NonEmptyText::as_str),
            record.text("categoryDisplay").as_ref().map(NonEmptyText::as_str),
        ),
        benefit: vec![benefit],
    };

    specific_cost.validate_at("specificCost")?;
    Ok(specific_cost)
}
