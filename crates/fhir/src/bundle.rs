//! Bundle wire model: the document returned by one mapping call.

use crate::datatypes::{Identifier, Meta, Reference};
use crate::insurance_plan::InsurancePlan;
use crate::organization::Organization;
use crate::validation::{check_language_tag, invalid, Validate};
use crate::FhirResult;
use chrono::{DateTime, SecondsFormat, Utc};
use nhcx_uuid::ResourceId;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// A resource that can be carried in an insurance-plan bundle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Organization(Organization),
    InsurancePlan(InsurancePlan),
}

impl Resource {
    pub fn id(&self) -> &ResourceId {
        match self {
            Resource::Organization(org) => &org.id,
            Resource::InsurancePlan(plan) => &plan.id,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            Resource::Organization(_) => Organization::RESOURCE_TYPE,
            Resource::InsurancePlan(_) => InsurancePlan::RESOURCE_TYPE,
        }
    }

    pub fn is_insurance_plan(&self) -> bool {
        matches!(self, Resource::InsurancePlan(_))
    }

    /// Validates the wrapped resource.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError::Validation`] naming the first offending element.
    pub fn validate(&self) -> FhirResult<()> {
        match self {
            Resource::Organization(org) => org.validate(),
            Resource::InsurancePlan(plan) => plan.validate(),
        }
    }

    /// References in this resource that point at another resource.
    pub fn targeted_references(&self) -> Vec<&Reference> {
        match self {
            Resource::Organization(_) => Vec::new(),
            Resource::InsurancePlan(plan) => plan.targeted_references().collect(),
        }
    }
}

impl From<Organization> for Resource {
    fn from(org: Organization) -> Self {
        Resource::Organization(org)
    }
}

impl From<InsurancePlan> for Resource {
    fn from(plan: InsurancePlan) -> Self {
        Resource::InsurancePlan(plan)
    }
}

/// One `(fullUrl, resource)` pair.
///
/// The `fullUrl` is derived from the resource id at construction and cannot be set separately,
/// so it always equals `urn:uuid:<resource.id>`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    full_url: String,
    resource: Resource,
}

impl BundleEntry {
    pub fn new(resource: Resource) -> Self {
        Self {
            full_url: resource.id().urn(),
            resource,
        }
    }

    pub fn full_url(&self) -> &str {
        &self.full_url
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }
}

/// Bundle type; insurance-plan bundles are always collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    Collection,
}

/// A Bundle resource.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "resourceType", rename = "Bundle")]
pub struct Bundle {
    pub id: ResourceId,

    pub meta: Meta,

    pub identifier: Identifier,

    #[serde(rename = "type")]
    pub type_: BundleType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(serialize_with = "serialize_instant")]
    pub timestamp: DateTime<Utc>,

    /// Always serialised, as `[]` when the bundle holds no resources.
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    pub const RESOURCE_TYPE: &'static str = "Bundle";

    /// Ids of all resources present in the bundle.
    pub fn entry_ids(&self) -> HashSet<ResourceId> {
        self.entry.iter().map(|e| *e.resource().id()).collect()
    }

    /// `urn:uuid:` targets that do not match any entry in this bundle.
    pub fn dangling_references(&self) -> Vec<String> {
        let ids = self.entry_ids();
        self.entry
            .iter()
            .flat_map(|e| e.resource().targeted_references())
            .filter_map(|r| r.reference.as_ref())
            .filter(|target| {
                ResourceId::from_urn(target)
                    .map(|id| !ids.contains(&id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect()
    }

    /// Validates the bundle shell, every entry, and bundle-level referential integrity.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError::Validation`] naming the first offending element.
    pub fn validate(&self) -> FhirResult<()> {
        self.validate_at(Self::RESOURCE_TYPE)
    }
}

impl Validate for Bundle {
    fn validate_at(&self, path: &str) -> FhirResult<()> {
        self.meta.validate_at(&format!("{path}.meta"))?;
        self.identifier.validate_at(&format!("{path}.identifier"))?;
        if let Some(language) = &self.language {
            check_language_tag(&format!("{path}.language"), language)?;
        }
        for (i, entry) in self.entry.iter().enumerate() {
            let entry_path = format!("{path}.entry[{i}]");
            if entry.full_url != entry.resource.id().urn() {
                return Err(invalid(
                    &format!("{entry_path}.fullUrl"),
                    "fullUrl must equal urn:uuid:<resource.id>",
                ));
            }
            entry.resource.validate()?;
        }
        if let Some(target) = self.dangling_references().into_iter().next() {
            return Err(invalid(
                &format!("{path}.entry"),
                format!("reference '{target}' does not resolve to an entry"),
            ));
        }
        Ok(())
    }
}

fn serialize_instant<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Meta;
    use crate::insurance_plan::PublicationStatus;
    use crate::FhirError;

    fn organization(name: &str) -> Organization {
        Organization {
            id: ResourceId::new(),
            meta: Meta::with_profile("https://example.org/Organization"),
            text: None,
            identifier: Vec::new(),
            type_: Vec::new(),
            name: name.into(),
            contact: Vec::new(),
        }
    }

    fn plan_owned_by(owner: &ResourceId) -> InsurancePlan {
        InsurancePlan {
            id: ResourceId::new(),
            meta: Meta::with_profile("https://example.org/InsurancePlan"),
            text: None,
            language: None,
            extension: Vec::new(),
            identifier: Vec::new(),
            status: PublicationStatus::Active,
            type_: Vec::new(),
            name: "Gold Plan".into(),
            alias: Vec::new(),
            period: None,
            owned_by: Reference::to(owner, None),
            administered_by: None,
            coverage_area: Vec::new(),
            contact: Vec::new(),
            network: Vec::new(),
            coverage: Vec::new(),
            plan: Vec::new(),
        }
    }

    fn bundle(entry: Vec<BundleEntry>) -> Bundle {
        Bundle {
            id: ResourceId::new(),
            meta: Meta::with_profile("https://example.org/Bundle"),
            identifier: Identifier::official("urn:ietf:rfc:3986", "urn:uuid:x"),
            type_: BundleType::Collection,
            language: Some("en-IN".into()),
            timestamp: Utc::now(),
            entry,
        }
    }

    #[test]
    fn entry_full_url_matches_resource_id() {
        let org = organization("Acme Health");
        let entry = BundleEntry::new(org.clone().into());
        assert_eq!(entry.full_url(), format!("urn:uuid:{}", org.id));
    }

    #[test]
    fn serialises_resource_type_tags() {
        let org = organization("Acme Health");
        let plan = plan_owned_by(&org.id);
        let b = bundle(vec![
            BundleEntry::new(plan.into()),
            BundleEntry::new(org.into()),
        ]);
        b.validate().expect("valid bundle");
        let value = serde_json::to_value(&b).expect("serialise");
        assert_eq!(value["resourceType"], "Bundle");
        assert_eq!(value["type"], "collection");
        assert_eq!(value["entry"][0]["resource"]["resourceType"], "InsurancePlan");
        assert_eq!(value["entry"][1]["resource"]["resourceType"], "Organization");
        let timestamp = value["timestamp"].as_str().expect("timestamp string");
        assert!(timestamp.ends_with('Z'));
    }

    #[test]
    fn empty_bundle_keeps_entry_list() {
        let value = serde_json::to_value(bundle(Vec::new())).expect("serialise");
        assert_eq!(value["entry"], serde_json::json!([]));
        assert_eq!(value["language"], "en-IN");
    }

    #[test]
    fn dangling_owner_reference_fails_validation() {
        let plan = plan_owned_by(&ResourceId::new());
        let b = bundle(vec![BundleEntry::new(plan.into())]);
        assert_eq!(b.dangling_references().len(), 1);
        let err = b.validate().expect_err("dangling reference");
        assert!(matches!(err, FhirError::Validation { message, .. } if message.contains("does not resolve")));
    }
}
