use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Model, ResourceKind};
use crate::checker::IsogeoUuid;

/// Namespace of keywords (`isogeo`, `inspire-theme`, `iso19115-topic`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thesaurus {
    #[serde(rename = "_abilities")]
    pub abilities: Option<Vec<String>>,
    #[serde(rename = "_id")]
    pub id: Option<IsogeoUuid>,
    pub code: Option<String>,
    pub name: Option<String>,
}

/// A keyword. Its label is named `$text` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
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
    /// Usage counts, by scope (`isogeo`, `group`...).
    pub count: Option<BTreeMap<String, i64>>,
    pub description: Option<String>,
    #[serde(alias = "$text")]
    pub text: Option<String>,
    pub thesaurus: Option<Thesaurus>,
}

impl Keyword {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

impl Model for Keyword {
    const KIND: ResourceKind = ResourceKind::Keyword;
    const CREATION_FIELDS: &'static [&'static str] = &["code", "text"];
    const CREATION_RENAMES: &'static [(&'static str, &'static str)] = &[("text", "$text")];
    const WIRE_QUIRKS: &'static [(&'static str, &'static str)] = &[("$text", "text")];
    const UNIQUENESS_FIELDS: &'static [&'static str] = &["text"];

    fn id(&self) -> Option<IsogeoUuid> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn reads_text_and_nested_thesaurus() {
        let keyword = Keyword::from_wire(json!({
            "_id": "1616597fbc4348c8b11ef9d59cf594c8",
            "_tag": "keyword:isogeo:roads",
            "$text": "roads",
            "code": "roads",
            "count": {"isogeo": 14, "group": 2},
            "thesaurus": {
                "_id": "1616597fbc4348c8b11ef9d59cf594c8",
                "code": "isogeo",
                "name": "Isogeo"
            }
        }))
        .unwrap();

        assert_eq!(keyword.text.as_deref(), Some("roads"));
        assert_eq!(keyword.count.as_ref().map(|c| c["isogeo"]), Some(14));
        assert_eq!(
            keyword.thesaurus.as_ref().and_then(|t| t.code.as_deref()),
            Some("isogeo")
        );
    }

    #[test]
    fn creation_projection_renames_text() {
        assert_eq!(
            Value::Object(Keyword::new("roads").to_wire_creation().unwrap()),
            json!({"code": null, "$text": "roads"})
        );
    }
}
