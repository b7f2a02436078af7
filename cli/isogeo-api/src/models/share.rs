use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Catalog, Model, ResourceKind, Workgroup};
use crate::checker::IsogeoUuid;

/// A share exposes catalogs of a workgroup to applications or groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    #[serde(rename = "_created")]
    pub created: Option<String>,
    #[serde(rename = "_creator")]
    pub creator: Option<Workgroup>,
    #[serde(rename = "_id")]
    pub id: Option<IsogeoUuid>,
    #[serde(rename = "_modified")]
    pub modified: Option<String>,
    pub applications: Option<Vec<Value>>,
    pub catalogs: Option<Vec<Catalog>>,
    pub groups: Option<Vec<Workgroup>>,
    pub name: Option<String>,
    pub rights: Option<Vec<String>>,
    /// `application` or `group`.
    #[serde(rename = "type")]
    pub share_type: Option<String>,
    pub url_token: Option<String>,
}

impl Share {
    /// Workgroup owning the share.
    pub fn owner(&self) -> Option<IsogeoUuid> {
        self.creator.as_ref()?.id
    }
}

impl Model for Share {
    const KIND: ResourceKind = ResourceKind::Share;
    const CREATION_FIELDS: &'static [&'static str] = &["name", "rights", "type"];

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
    fn nested_catalogs_read_scan() {
        let share = Share::from_wire(json!({
            "_id": "1e07910d365449b59b6596a9b428ecd9",
            "_creator": {"_id": "32f7e95ec4e94ca3bc1afda960003882"},
            "catalogs": [
                {"_id": "d220a5fb5e8a4e6ea4bf5a3b5a4e9b57", "name": "Roads", "$scan": true}
            ],
            "name": "Open data",
            "type": "application",
            "urlToken": "ab12"
        }))
        .unwrap();

        assert_eq!(
            share.owner(),
            Some("32f7e95ec4e94ca3bc1afda960003882".parse().unwrap())
        );
        let catalogs = share.catalogs.unwrap();
        assert_eq!(catalogs[0].scan, Some(true));
        assert_eq!(share.url_token.as_deref(), Some("ab12"));
    }
}
