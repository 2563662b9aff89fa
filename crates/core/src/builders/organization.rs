use super::{telecom, BuildContext};
use crate::constants::{
    NAME_FALLBACK, NETWORK_TYPE_CODE, NETWORK_TYPE_DISPLAY, PROFILE_ORGANIZATION,
    SYS_INSURER_IDENTIFIER, SYS_NETWORK_IDENTIFIER, SYS_ORGANIZATION_TYPE, SYS_TPA_IDENTIFIER,
};
use crate::primitives::{concept, narrative};
use crate::record::Record;
use fhir::{
    CodeableConcept, ContactDetail, ContactPoint, ContactPointSystem, Identifier, Meta,
    Organization, Reference,
};
use nhcx_types::NonEmptyText;

/// The part an organization plays in the plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrganizationRole {
    Insurer,
    Tpa,
    Network,
}

impl OrganizationRole {
    fn identifier_system(self) -> &'static str {
        match self {
            Self::Insurer => SYS_INSURER_IDENTIFIER,
            Self::Tpa => SYS_TPA_IDENTIFIER,
            Self::Network => SYS_NETWORK_IDENTIFIER,
        }
    }

    /// Name used in narratives.
    pub fn label(self) -> &'static str {
        match self {
            Self::Insurer => "Insurer",
            Self::Tpa => "TPA",
            Self::Network => "Network",
        }
    }

    /// Record location, used as warning and log context.
    pub fn context(self) -> &'static str {
        match self {
            Self::Insurer => "organisation",
            Self::Tpa => "tpaOrganisation",
            Self::Network => "insurancePlan.networks",
        }
    }
}

const ORGANIZATION_TELECOM: [(&str, ContactPointSystem); 3] = [
    ("phone", ContactPointSystem::Phone),
    ("email", ContactPointSystem::Email),
    ("website", ContactPointSystem::Url),
];

/// Builds an insurer or TPA organization and adds it to the bundle.
///
/// Returns `None` for an empty record or when the organization fails validation; otherwise a
/// reference to the new entry, displaying the organization name.
pub fn build_organization(
    ctx: &mut BuildContext<'_>,
    record: Record<'_>,
    role: OrganizationRole,
) -> Option<Reference> {
    if record.is_empty() {
        tracing::debug!(role = role.context(), "no organization data");
        return None;
    }

    let name = match record.text("name") {
        Some(name) => name.into_string(),
        None => {
            ctx.diagnostics
                .missing_required(role.context(), "name", NAME_FALLBACK);
            NAME_FALLBACK.to_string()
        }
    };

    add_organization(
        ctx,
        role,
        name,
        record.text("identifier"),
        telecom(&record, &ORGANIZATION_TELECOM),
    )
}

/// Builds one provider-network organization per name, in order.
pub fn build_networks(ctx: &mut BuildContext<'_>, names: &[NonEmptyText]) -> Vec<Reference> {
    names
        .iter()
        .filter_map(|name| {
            add_organization(
                ctx,
                OrganizationRole::Network,
                name.as_str().to_string(),
                None,
                Vec::new(),
            )
        })
        .collect()
}

fn add_organization(
    ctx: &mut BuildContext<'_>,
    role: OrganizationRole,
    name: String,
    external_identifier: Option<NonEmptyText>,
    telecom: Vec<ContactPoint>,
) -> Option<Reference> {
    let id = ctx.assembler.allocate_id();
    let identifier_value = match external_identifier {
        Some(value) => value.into_string(),
        None => ctx.assembler.allocate_urn(),
    };

    let type_: Vec<CodeableConcept> = match role {
        OrganizationRole::Network => concept(
            Some(NETWORK_TYPE_CODE),
            Some(NETWORK_TYPE_DISPLAY),
            Some(SYS_ORGANIZATION_TYPE),
            None,
        )
        .into_iter()
        .collect(),
        _ => Vec::new(),
    };

    let contact = if telecom.is_empty() {
        Vec::new()
    } else {
        vec![ContactDetail {
            telecom,
            ..ContactDetail::default()
        }]
    };

    let organization = Organization {
        id,
        meta: Meta::with_profile(PROFILE_ORGANIZATION),
        text: Some(narrative(&format!("{} organization: {name}.", role.label()))),
        identifier: vec![Identifier::official(role.identifier_system(), identifier_value)],
        type_,
        name: name.clone(),
        contact,
    };

    if let Err(e) = organization.validate() {
        tracing::error!(role = role.context(), "skipping organization that failed validation: {e}");
        return None;
    }

    ctx.assembler.add_entry(organization.into());
    ctx.assembler.reference_to(&id, Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminology::Terminology;
    use fhir::Resource;
    use serde_json::json;

    fn organization_in(ctx: &BuildContext<'_>, reference: &Reference) -> Organization {
        let target = reference.target().expect("targeted reference");
        ctx.assembler
            .entries()
            .iter()
            .find_map(|e| match e.resource() {
                Resource::Organization(org) if org.id == target => Some(org.clone()),
                _ => None,
            })
            .expect("organization entry")
    }

    #[test]
    fn empty_record_yields_no_reference() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!({});
        assert!(build_organization(&mut ctx, Record::new(&value), OrganizationRole::Tpa).is_none());
        assert!(ctx.assembler.entries().is_empty());
    }

    #[test]
    fn insurer_with_contact_points() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!({
            "name": "Acme Health",
            "phone": "+91-1800-123-4567",
            "email": " ",
            "website": "https://acme.example"
        });
        let reference = build_organization(&mut ctx, Record::new(&value), OrganizationRole::Insurer)
            .expect("reference");
        assert_eq!(reference.display.as_deref(), Some("Acme Health"));

        let org = organization_in(&ctx, &reference);
        assert_eq!(org.identifier[0].system.as_deref(), Some(SYS_INSURER_IDENTIFIER));
        assert!(org.identifier[0]
            .value
            .as_deref()
            .expect("identifier value")
            .starts_with("urn:uuid:"));
        let systems: Vec<ContactPointSystem> =
            org.contact[0].telecom.iter().map(|c| c.system).collect();
        assert_eq!(systems, vec![ContactPointSystem::Phone, ContactPointSystem::Url]);
        assert!(org
            .text
            .as_ref()
            .expect("narrative")
            .div
            .contains("Insurer organization: Acme Health."));
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn tpa_keeps_external_identifier_and_omits_empty_contact() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!({"name": "Speedy TPA", "identifier": "IRDAI/TPA/2024/001"});
        let reference = build_organization(&mut ctx, Record::new(&value), OrganizationRole::Tpa)
            .expect("reference");
        let org = organization_in(&ctx, &reference);
        assert_eq!(
            org.identifier[0],
            Identifier::official(SYS_TPA_IDENTIFIER, "IRDAI/TPA/2024/001")
        );
        assert!(org.contact.is_empty());
    }

    #[test]
    fn missing_name_falls_back_with_warning() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let value = json!({"phone": "12345"});
        let reference = build_organization(&mut ctx, Record::new(&value), OrganizationRole::Insurer)
            .expect("reference");
        assert_eq!(organization_in(&ctx, &reference).name, "Unknown");
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics.warnings()[0].field, "name");
    }

    #[test]
    fn networks_carry_provider_network_type() {
        let t = Terminology::empty();
        let mut ctx = BuildContext::new(&t, "en-IN");
        let names = vec![
            NonEmptyText::new("NetA").expect("name"),
            NonEmptyText::new("NetB").expect("name"),
        ];
        let refs = build_networks(&mut ctx, &names);
        let displays: Vec<&str> = refs.iter().filter_map(|r| r.display.as_deref()).collect();
        assert_eq!(displays, vec!["NetA", "NetB"]);

        let org = organization_in(&ctx, &refs[0]);
        assert_eq!(org.type_[0].first_code(), Some(NETWORK_TYPE_CODE));
        assert_eq!(org.identifier[0].system.as_deref(), Some(SYS_NETWORK_IDENTIFIER));
    }
}
