use serde::{Deserialize, Serialize};

use super::{Model, ResourceKind, Workgroup};
use crate::checker::IsogeoUuid;

/// A catalog groups metadata of a workgroup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
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
    pub code: Option<String>,
    pub count: Option<i64>,
    pub name: Option<String>,
    pub owner: Option<Workgroup>,
    /// Whether the catalog is fed by the scan. Named `$scan` on the wire.
    #[serde(alias = "$scan")]
    pub scan: Option<bool>,
}

impl Catalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

impl Model for Catalog {
    const KIND: ResourceKind = ResourceKind::Catalog;
    const CREATION_FIELDS: &'static [&'static str] = &["code", "name", "scan"];
    const CREATION_RENAMES: &'static [(&'static str, &'static str)] = &[("scan", "$scan")];
    const WIRE_QUIRKS: &'static [(&'static str, &'static str)] = &[("$scan", "scan")];

    fn id(&self) -> Option<IsogeoUuid> {
        self.id
    }
}
