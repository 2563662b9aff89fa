//! Bundle assembly.
//!
//! The assembler owns the bundle for one mapping call. It allocates every synthetic id from a
//! single [`IdAllocator`], appends entries in construction order, and only hands out references
//! to resources it already holds, so no reference in the finished bundle can dangle.
//!
//! Finishing the bundle moves any InsurancePlan to the front. Serialising it applies the
//! contact-name compatibility fixup: the wire model carries `contact.name` as a list, but the
//! downstream validator expects a single HumanName object there.

use crate::constants::{PROFILE_INSURANCE_PLAN_BUNDLE, SYS_URN_IDENTIFIER};
use crate::{CoreError, CoreResult};
use chrono::Utc;
use fhir::{Bundle, BundleEntry, BundleType, Identifier, Meta, Reference, Resource};
use nhcx_uuid::{IdAllocator, ResourceId};
use serde_json::Value;

pub struct BundleAssembler {
    ids: IdAllocator,
    bundle_id: ResourceId,
    business_identifier: String,
    language: String,
    entries: Vec<BundleEntry>,
}

impl BundleAssembler {
    /// Allocates the bundle shell: its id and business identifier.
    pub fn new(language: &str) -> Self {
        let mut ids = IdAllocator::new();
        let bundle_id = ids.allocate();
        let business_identifier = ids.allocate_urn();
        Self {
            ids,
            bundle_id,
            business_identifier,
            language: language.to_string(),
            entries: Vec::new(),
        }
    }

    /// Issues a resource id unique within this bundle.
    pub fn allocate_id(&mut self) -> ResourceId {
        self.ids.allocate()
    }

    /// Issues a `urn:uuid:` business identifier value unique within this bundle.
    pub fn allocate_urn(&mut self) -> String {
        self.ids.allocate_urn()
    }

    /// Appends `resource` as a new entry with `fullUrl = urn:uuid:<id>` and returns its id.
    pub fn add_entry(&mut self, resource: Resource) -> ResourceId {
        let id = *resource.id();
        tracing::debug!(
            resource_type = resource.resource_type(),
            %id,
            "adding bundle entry"
        );
        self.entries.push(BundleEntry::new(resource));
        id
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.iter().any(|e| e.resource().id() == id)
    }

    /// A reference to an entry already in the bundle, or `None` if `id` is not present.
    pub fn reference_to(&self, id: &ResourceId, display: Option<String>) -> Option<Reference> {
        self.contains(id).then(|| Reference::to(id, display))
    }

    pub fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    /// Produces the finished bundle with any InsurancePlan ahead of all other entries.
    ///
    /// The sort is stable, so entries of equal rank keep their insertion order.
    pub fn finish(self) -> Bundle {
        let mut entry = self.entries;
        entry.sort_by_key(|e| !e.resource().is_insurance_plan());

        Bundle {
            id: self.bundle_id,
            meta: Meta::with_profile(PROFILE_INSURANCE_PLAN_BUNDLE),
            identifier: Identifier::official(SYS_URN_IDENTIFIER, self.business_identifier),
            type_: BundleType::Collection,
            language: Some(self.language),
            timestamp: Utc::now(),
            entry,
        }
    }
}

/// Serialises `bundle` to its JSON document form and applies the contact-name fixup.
///
/// # Errors
///
/// Returns [`CoreError::Serialization`] if the bundle cannot be serialised.
pub fn to_document(bundle: &Bundle) -> CoreResult<Value> {
    let mut document = serde_json::to_value(bundle).map_err(CoreError::Serialization)?;
    collapse_contact_names(&mut document);
    Ok(document)
}

/// Collapses a single-element `contact[].name` list to the contained object on every
/// Organization and InsurancePlan in the document.
///
/// Lists of any other length and resources of any other type are left untouched.
pub fn collapse_contact_names(document: &mut Value) {
    let Some(entries) = document.get_mut("entry").and_then(Value::as_array_mut) else {
        return;
    };
    for resource in entries.iter_mut().filter_map(|e| e.get_mut("resource")) {
        let resource_type = resource.get("resourceType").and_then(Value::as_str);
        if !matches!(resource_type, Some("Organization" | "InsurancePlan")) {
            continue;
        }
        let Some(contacts) = resource.get_mut("contact").and_then(Value::as_array_mut) else {
            continue;
        };
        for contact in contacts.iter_mut().filter_map(Value::as_object_mut) {
            if let Some(Value::Array(names)) = contact.get_mut("name") {
                if names.len() == 1 {
                    let name = names.remove(0);
                    contact.insert("name".to_string(), name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PROFILE_INSURANCE_PLAN, PROFILE_ORGANIZATION};
    use fhir::{ContactDetail, HumanName, InsurancePlan, Organization, PublicationStatus};
    use serde_json::json;

    fn organization(id: ResourceId, name: &str) -> Resource {
        Organization {
            id,
            meta: Meta::with_profile(PROFILE_ORGANIZATION),
            text: None,
            identifier: Vec::new(),
            type_: Vec::new(),
            name: name.into(),
            contact: Vec::new(),
        }
        .into()
    }

    fn plan(id: ResourceId, owner: Reference) -> Resource {
        InsurancePlan {
            id,
            meta: Meta::with_profile(PROFILE_INSURANCE_PLAN),
            text: None,
            language: None,
            extension: Vec::new(),
            identifier: Vec::new(),
            status: PublicationStatus::Active,
            type_: Vec::new(),
            name: "Gold Plan".into(),
            alias: Vec::new(),
            period: None,
            owned_by: owner,
            administered_by: None,
            coverage_area: Vec::new(),
            contact: vec![ContactDetail {
                name: vec![HumanName::from_text("Claims Team")],
                ..ContactDetail::default()
            }],
            network: Vec::new(),
            coverage: Vec::new(),
            plan: Vec::new(),
        }
        .into()
    }

    #[test]
    fn reference_only_to_present_entries() {
        let mut assembler = BundleAssembler::new("en-IN");
        let stray = assembler.allocate_id();
        assert!(assembler.reference_to(&stray, None).is_none());

        let id = assembler.allocate_id();
        assembler.add_entry(organization(id, "Acme"));
        let reference = assembler
            .reference_to(&id, Some("Acme".into()))
            .expect("present entry");
        assert_eq!(reference.reference, Some(format!("urn:uuid:{id}")));
    }

    #[test]
    fn insurance_plan_moves_first_and_others_keep_order() {
        let mut assembler = BundleAssembler::new("en-IN");
        let insurer = assembler.allocate_id();
        assembler.add_entry(organization(insurer, "Insurer"));
        let tpa = assembler.allocate_id();
        assembler.add_entry(organization(tpa, "TPA"));
        let owner = assembler.reference_to(&insurer, None).expect("owner");
        let plan_id = assembler.allocate_id();
        assembler.add_entry(plan(plan_id, owner));

        let bundle = assembler.finish();
        let ids: Vec<ResourceId> = bundle.entry.iter().map(|e| *e.resource().id()).collect();
        assert_eq!(ids, vec![plan_id, insurer, tpa]);
        bundle.validate().expect("valid bundle");
        assert!(bundle.dangling_references().is_empty());
    }

    #[test]
    fn bundle_ids_are_distinct() {
        let mut assembler = BundleAssembler::new("en-IN");
        let a = assembler.allocate_id();
        let b = assembler.allocate_id();
        assert_ne!(a, b);
        let bundle = assembler.finish();
        assert_ne!(bundle.id, a);
        assert_ne!(bundle.id, b);
        assert_eq!(bundle.language.as_deref(), Some("en-IN"));
    }

    #[test]
    fn document_collapses_single_contact_name() {
        let mut assembler = BundleAssembler::new("en-IN");
        let insurer = assembler.allocate_id();
        assembler.add_entry(organization(insurer, "Insurer"));
        let owner = assembler.reference_to(&insurer, None).expect("owner");
        let plan_id = assembler.allocate_id();
        assembler.add_entry(plan(plan_id, owner));

        let document = to_document(&assembler.finish()).expect("document");
        assert_eq!(document["resourceType"], "Bundle");
        assert_eq!(
            document["entry"][0]["resource"]["contact"][0]["name"],
            json!({"text": "Claims Team"})
        );
    }

    #[test]
    fn fixup_leaves_other_shapes_alone() {
        let mut document = json!({
            "entry": [
                {"resource": {"resourceType": "Patient", "contact": [{"name": [{"text": "A"}]}]}},
                {"resource": {"resourceType": "Organization", "contact": [
                    {"name": [{"text": "A"}, {"text": "B"}]},
                    {"name": {"text": "C"}},
                    {"telecom": []}
                ]}}
            ]
        });
        let before = document.clone();
        collapse_contact_names(&mut document);
        assert_eq!(document, before);
    }
}
