use serde::{Deserialize, Serialize};

use super::{Model, ResourceKind, Workgroup};
use crate::checker::IsogeoUuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    #[serde(rename = "_abilities")]
    pub abilities: Option<Vec<String>>,
    #[serde(rename = "_id")]
    pub id: Option<IsogeoUuid>,
    #[serde(rename = "_tag")]
    pub tag: Option<String>,
    pub count: Option<i64>,
    pub link: Option<String>,
    pub name: Option<String>,
    pub owner: Option<Workgroup>,
    /// Publication date.
    pub published: Option<String>,
}

impl Model for Specification {
    const KIND: ResourceKind = ResourceKind::Specification;
    const CREATION_FIELDS: &'static [&'static str] = &["link", "name", "published"];

    fn id(&self) -> Option<IsogeoUuid> {
        self.id
    }
}
