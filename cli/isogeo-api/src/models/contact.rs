use serde::{Deserialize, Serialize};

use super::{Model, ResourceKind};
use crate::checker::IsogeoUuid;

/// A contact of a workgroup address book.
///
/// Read under `fax`, `organization` and `phone`, but created with
/// `faxNumber`, `organizationName` and `phoneNumber`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_abilities")]
    pub abilities: Option<Vec<String>>,
    #[serde(rename = "_id")]
    pub id: Option<IsogeoUuid>,
    #[serde(rename = "_tag")]
    pub tag: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub address_line3: Option<String>,
    pub city: Option<String>,
    pub count: Option<i64>,
    pub country_code: Option<String>,
    pub email: Option<String>,
    pub fax: Option<String>,
    pub name: Option<String>,
    pub organization: Option<String>,
    pub phone: Option<String>,
    /// `custom` for workgroup contacts, `group` for workgroup owners.
    #[serde(rename = "type")]
    pub contact_type: Option<String>,
    pub zip_code: Option<String>,
}

impl Model for Contact {
    const KIND: ResourceKind = ResourceKind::Contact;
    const CREATION_FIELDS: &'static [&'static str] = &[
        "addressLine1",
        "addressLine2",
        "addressLine3",
        "city",
        "countryCode",
        "email",
        "fax",
        "name",
        "organization",
        "phone",
        "zipCode",
    ];
    const CREATION_RENAMES: &'static [(&'static str, &'static str)] = &[
        ("fax", "faxNumber"),
        ("organization", "organizationName"),
        ("phone", "phoneNumber"),
    ];
    const UNIQUENESS_FIELDS: &'static [&'static str] = &["name", "email"];

    fn id(&self) -> Option<IsogeoUuid> {
        self.id
    }
}
