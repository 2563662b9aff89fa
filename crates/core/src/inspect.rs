//! Checks and summaries over an already-generated bundle document.
//!
//! These work on raw JSON so they accept bundles from any source, not only ones produced by the
//! mapper in this process.

use crate::constants::EXT_EXCLUSION;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// How serious an inspection finding is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub field: String,
    pub message: String,
}

/// Result of [`validate_bundle`]. `valid` is false when any issue has error severity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issue_count: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: !issues.iter().any(|i| i.severity == Severity::Error),
            issue_count: issues.len(),
            issues,
        }
    }
}

fn issue(severity: Severity, field: impl Into<String>, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        severity,
        field: field.into(),
        message: message.into(),
    }
}

fn entries(document: &Value) -> &[Value] {
    document
        .get("entry")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn resources_of<'a>(document: &'a Value, resource_type: &'a str) -> impl Iterator<Item = &'a Value> {
    entries(document)
        .iter()
        .filter_map(|e| e.get("resource"))
        .filter(move |r| r.get("resourceType").and_then(Value::as_str) == Some(resource_type))
}

/// FHIR "has a value": not absent, null, blank text, or an empty array or object.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}

/// Checks a bundle document for the shape an insurance-plan bundle must have.
pub fn validate_bundle(document: &Value) -> ValidationReport {
    let mut issues = Vec::new();

    if document.get("resourceType").and_then(Value::as_str) != Some("Bundle") {
        issues.push(issue(Severity::Error, "resourceType", "Must be 'Bundle'"));
    }
    if document.get("type").and_then(Value::as_str) != Some("collection") {
        issues.push(issue(
            Severity::Warning,
            "type",
            "Expected bundle type 'collection'",
        ));
    }

    match resources_of(document, "InsurancePlan").next() {
        None => issues.push(issue(
            Severity::Error,
            "entry",
            "No InsurancePlan resource found in bundle",
        )),
        Some(plan) => {
            for field in ["name", "status", "ownedBy", "identifier"] {
                if !is_present(plan.get(field)) {
                    issues.push(issue(
                        Severity::Error,
                        format!("InsurancePlan.{field}"),
                        format!("Required field '{field}' is missing or empty"),
                    ));
                }
            }
            if !is_present(plan.pointer("/meta/profile")) {
                issues.push(issue(
                    Severity::Warning,
                    "InsurancePlan.meta.profile",
                    "No profile URL set on InsurancePlan",
                ));
            }
            if !is_present(plan.get("text")) {
                issues.push(issue(
                    Severity::Info,
                    "InsurancePlan.text",
                    "Narrative text is absent",
                ));
            }
        }
    }

    if resources_of(document, "Organization").next().is_none() {
        issues.push(issue(
            Severity::Error,
            "entry",
            "No Organization resource found in bundle",
        ));
    }

    let mut full_urls = HashSet::new();
    for (i, entry) in entries(document).iter().enumerate() {
        let full_url = entry.get("fullUrl").and_then(Value::as_str);
        let id = entry.pointer("/resource/id").and_then(Value::as_str);
        match (full_url, id) {
            (Some(url), Some(id)) if url == format!("urn:uuid:{id}") => {
                full_urls.insert(url.to_string());
            }
            _ => issues.push(issue(
                Severity::Error,
                format!("entry[{i}].fullUrl"),
                "fullUrl must equal urn:uuid:<resource.id>",
            )),
        }
    }

    for plan in resources_of(document, "InsurancePlan") {
        for (field, reference) in targeted_references(plan) {
            if !full_urls.contains(reference) {
                issues.push(issue(
                    Severity::Error,
                    format!("InsurancePlan.{field}"),
                    format!("Reference '{reference}' does not resolve to an entry in the bundle"),
                ));
            }
        }
    }

    ValidationReport::from_issues(issues)
}

/// `(field path, reference)` for every reference in a plan that carries a target.
fn targeted_references(plan: &Value) -> Vec<(String, &str)> {
    let single = ["ownedBy", "administeredBy"]
        .into_iter()
        .filter_map(|field| {
            plan.get(field)
                .and_then(|r| r.get("reference"))
                .and_then(Value::as_str)
                .map(|r| (field.to_string(), r))
        });
    let listed = ["network", "coverageArea"].into_iter().flat_map(|field| {
        plan.get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(move |(i, r)| {
                r.get("reference")
                    .and_then(Value::as_str)
                    .map(|r| (format!("{field}[{i}]"), r))
            })
    });
    single.chain(listed).collect()
}

/// Start and end of the plan period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub start: String,
    pub end: String,
}

/// Human-oriented digest of an insurance-plan bundle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSummary {
    pub plan_name: String,
    pub alias: Vec<String>,
    pub status: String,
    pub language: String,
    pub plan_type: String,
    pub period: PeriodSummary,
    pub insurer: String,
    pub tpa: Option<String>,
    pub networks: Vec<String>,
    pub coverage_count: usize,
    pub benefit_count: usize,
    pub plan_count: usize,
    pub exclusion_count: usize,
    pub total_resources: usize,
    pub coverage_names: Vec<String>,
    pub benefit_names: Vec<String>,
    pub plan_names: Vec<String>,
    pub exclusion_names: Vec<String>,
}

const NOT_AVAILABLE: &str = "N/A";

fn str_or<'a>(value: Option<&'a Value>, default: &'a str) -> String {
    value.and_then(Value::as_str).unwrap_or(default).to_string()
}

fn array<'a>(value: Option<&'a Value>) -> &'a [Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// A concept's label: its text, else its first coding's display.
fn concept_label(concept: Option<&Value>) -> Option<&str> {
    let concept = concept?;
    concept
        .get("text")
        .and_then(Value::as_str)
        .or_else(|| concept.pointer("/coding/0/display").and_then(Value::as_str))
}

fn push_unique(names: &mut Vec<String>, name: Option<&str>) {
    if let Some(name) = name {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
}

/// Summarises the first InsurancePlan in a bundle and the organizations around it.
///
/// The insurer is the organization the plan's `ownedBy` points at, falling back to the first
/// organization; the TPA is the one `administeredBy` points at.
pub fn summarize_bundle(document: &Value) -> BundleSummary {
    let empty = Value::Null;
    let plan = resources_of(document, "InsurancePlan").next().unwrap_or(&empty);
    let organizations: Vec<&Value> = resources_of(document, "Organization").collect();

    let find_org = |reference: Option<&str>| {
        let reference = reference?;
        organizations.iter().copied().find(|org| {
            org.get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| reference == format!("urn:uuid:{id}"))
        })
    };

    let owner_ref = plan.pointer("/ownedBy/reference").and_then(Value::as_str);
    let insurer = find_org(owner_ref).or_else(|| organizations.first().copied());
    let admin_ref = plan.pointer("/administeredBy/reference").and_then(Value::as_str);
    let tpa = find_org(admin_ref);

    let plan_type = plan.pointer("/type/0/coding/0");
    let plan_type = plan_type
        .and_then(|c| c.get("display"))
        .or_else(|| plan_type.and_then(|c| c.get("code")))
        .and_then(Value::as_str)
        .unwrap_or(NOT_AVAILABLE)
        .to_string();

    let coverages = array(plan.get("coverage"));
    let mut coverage_names = Vec::new();
    let mut benefit_names = Vec::new();
    for coverage in coverages {
        push_unique(&mut coverage_names, concept_label(coverage.get("type")));
        for benefit in array(coverage.get("benefit")) {
            push_unique(&mut benefit_names, concept_label(benefit.get("type")));
        }
    }

    let plans = array(plan.get("plan"));
    let mut plan_names = Vec::new();
    for financial_plan in plans {
        push_unique(&mut plan_names, concept_label(financial_plan.get("type")));
    }

    let exclusions: Vec<&Value> = array(plan.get("extension"))
        .iter()
        .filter(|ext| {
            ext.get("url")
                .and_then(Value::as_str)
                .is_some_and(|url| url == EXT_EXCLUSION || url.to_lowercase().contains("exclusion"))
        })
        .collect();
    let mut exclusion_names = Vec::new();
    for exclusion in &exclusions {
        push_unique(
            &mut exclusion_names,
            concept_label(exclusion.pointer("/extension/0/valueCodeableConcept")),
        );
    }

    BundleSummary {
        plan_name: str_or(plan.get("name"), NOT_AVAILABLE),
        alias: array(plan.get("alias"))
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        status: str_or(plan.get("status"), "unknown"),
        language: str_or(plan.get("language"), NOT_AVAILABLE),
        plan_type,
        period: PeriodSummary {
            start: str_or(plan.pointer("/period/start"), NOT_AVAILABLE),
            end: str_or(plan.pointer("/period/end"), NOT_AVAILABLE),
        },
        insurer: str_or(insurer.and_then(|o| o.get("name")), NOT_AVAILABLE),
        tpa: tpa
            .and_then(|o| o.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        networks: array(plan.get("network"))
            .iter()
            .map(|n| str_or(n.get("display"), ""))
            .collect(),
        coverage_count: coverages.len(),
        benefit_count: coverages
            .iter()
            .map(|c| array(c.get("benefit")).len())
            .sum(),
        plan_count: plans.len(),
        exclusion_count: exclusions.len(),
        total_resources: entries(document).len(),
        coverage_names,
        benefit_names,
        plan_names,
        exclusion_names,
    }
}
