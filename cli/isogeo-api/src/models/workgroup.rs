use serde::{Deserialize, Serialize};

use super::{Contact, Model, ResourceKind};
use crate::checker::IsogeoUuid;

/// A workgroup, owner of catalogs, contacts, licenses, shares...
///
/// The display name of a workgroup is the name of its contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workgroup {
    #[serde(rename = "_abilities")]
    pub abilities: Option<Vec<String>>,
    #[serde(rename = "_created")]
    pub created: Option<String>,
    #[serde(rename = "_id")]
    pub id: Option<IsogeoUuid>,
    #[serde(rename = "_modified")]
    pub modified: Option<String>,
    #[serde(rename = "_tag")]
    pub tag: Option<String>,
    pub are_keywords_restricted: Option<bool>,
    pub can_create_legacy_service_links: Option<bool>,
    pub can_create_metadata: Option<bool>,
    pub code: Option<String>,
    pub contact: Option<Contact>,
    pub has_csw_client: Option<bool>,
    pub has_scan_fme: Option<bool>,
    pub keywords_casing: Option<String>,
    pub metadata_language: Option<String>,
    pub theme_color: Option<String>,
}

impl Workgroup {
    pub fn name(&self) -> Option<&str> {
        self.contact.as_ref()?.name.as_deref()
    }
}

impl Model for Workgroup {
    const KIND: ResourceKind = ResourceKind::Workgroup;
    const CREATION_FIELDS: &'static [&'static str] = &[
        "canCreateLegacyServiceLinks",
        "canCreateMetadata",
        "code",
        "contact",
        "keywordsCasing",
        "metadataLanguage",
    ];
    const UNIQUENESS_FIELDS: &'static [&'static str] = &["code"];

    fn id(&self) -> Option<IsogeoUuid> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_nested_contact() {
        let workgroup = Workgroup::from_wire(json!({
            "_id": "32f7e95ec4e94ca3bc1afda960003882",
            "_tag": "owner:32f7e95ec4e94ca3bc1afda960003882",
            "areKeywordsRestricted": false,
            "canCreateMetadata": true,
            "code": "isogeo-test",
            "contact": {
                "_id": "2a3aefc4f80347f590afe58127f6cb0f",
                "name": "Isogeo Test",
                "phone": "+33 1 23 45 67 89"
            },
            "limits": {"canDiffuse": false}
        }))
        .unwrap();

        assert_eq!(workgroup.name(), Some("Isogeo Test"));
        assert_eq!(workgroup.can_create_metadata, Some(true));
        assert_eq!(
            workgroup.contact.and_then(|c| c.phone).as_deref(),
            Some("+33 1 23 45 67 89")
        );
    }
}
