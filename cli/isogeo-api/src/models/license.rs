use serde::{Deserialize, Serialize};

use super::{Model, ResourceKind, Workgroup};
use crate::checker::IsogeoUuid;

/// A license, either from the Isogeo referential or specific to a workgroup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "_abilities")]
    pub abilities: Option<Vec<String>>,
    #[serde(rename = "_id")]
    pub id: Option<IsogeoUuid>,
    #[serde(rename = "_tag")]
    pub tag: Option<String>,
    pub content: Option<String>,
    pub count: Option<i64>,
    pub link: Option<String>,
    pub name: Option<String>,
    pub owner: Option<Workgroup>,
}

impl Model for License {
    const KIND: ResourceKind = ResourceKind::License;
    const CREATION_FIELDS: &'static [&'static str] = &["content", "link", "name"];

    fn id(&self) -> Option<IsogeoUuid> {
        self.id
    }
}
