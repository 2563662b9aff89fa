use super::telecom;
use crate::constants::{CONTACT_PURPOSE_CODE, CONTACT_PURPOSE_DISPLAY, SYS_CONTACT_ENTITY_TYPE};
use crate::primitives::concept;
use crate::record::Record;
use fhir::{ContactDetail, ContactPointSystem, HumanName};

const CONTACT_TELECOM: [(&str, ContactPointSystem); 2] = [
    ("phone", ContactPointSystem::Phone),
    ("email", ContactPointSystem::Email),
];

/// Builds plan contacts. Entries with nothing usable are dropped.
///
/// A contact's name is held as a one-element list here; the bundle fixup collapses it when the
/// document is serialised.
pub fn build_contacts(records: &[Record<'_>]) -> Vec<ContactDetail> {
    records
        .iter()
        .map(|record| ContactDetail {
            purpose: record.text("purpose").and_then(|purpose| {
                concept(
                    Some(CONTACT_PURPOSE_CODE),
                    Some(CONTACT_PURPOSE_DISPLAY),
                    Some(SYS_CONTACT_ENTITY_TYPE),
                    Some(purpose.as_str()),
                )
            }),
            name: record
                .text("name")
                .map(|name| HumanName::from_text(name.into_string()))
                .into_iter()
                .collect(),
            telecom: telecom(record, &CONTACT_TELECOM),
        })
        .filter(|contact| !contact.is_empty())
        .collect()
}
