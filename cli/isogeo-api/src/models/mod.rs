//! Typed records of the Isogeo API and their wire mapping.
//!
//! Every record has two projections:
//! - the *full* projection, every declared field under its in-memory name
//!   (absent values as `null`), nested records expanded the same way;
//! - the *creation* projection, the writable subset sent on `POST`, where
//!   some fields take a different name on the wire (`scan` is sent as
//!   `$scan`, a contact's `phone` as `phoneNumber`...).
//!
//! Records are not extensible: wire fields a record does not declare are
//! dropped when reading.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::checker::IsogeoUuid;

mod catalog;
mod contact;
mod keyword;
mod license;
mod metadata;
mod search;
mod share;
mod specification;
mod workgroup;

pub use catalog::Catalog;
pub use contact::Contact;
pub use keyword::{Keyword, Thesaurus};
pub use license::License;
pub use metadata::{CoordinateSystem, FeatureAttribute, Metadata};
pub use search::{KeywordSearch, ResourceSearch};
pub use share::Share;
pub use specification::Specification;
pub use workgroup::Workgroup;

/// Separator of the values composing a uniqueness key.
const KEY_SEPARATOR: &str = "\u{1f}";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("could not serialize {kind} record")]
    Serialize {
        kind: ResourceKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not read {kind} record")]
    Deserialize {
        kind: ResourceKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("{kind} record is not a JSON object")]
    NotAnObject { kind: ResourceKind },
}

/// Resource families with their own route set and name cache scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Catalog,
    Contact,
    Keyword,
    License,
    Metadata,
    Share,
    Specification,
    Workgroup,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Catalog => "catalog",
            ResourceKind::Contact => "contact",
            ResourceKind::Keyword => "keyword",
            ResourceKind::License => "license",
            ResourceKind::Metadata => "metadata",
            ResourceKind::Share => "share",
            ResourceKind::Specification => "specification",
            ResourceKind::Workgroup => "workgroup",
        };
        write!(f, "{name}")
    }
}

/// Wire mapping shared by all records.
pub trait Model:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    const KIND: ResourceKind;

    /// Writable fields, by in-memory name.
    const CREATION_FIELDS: &'static [&'static str];

    /// `(memory name, wire name)` pairs applied to the creation projection only.
    const CREATION_RENAMES: &'static [(&'static str, &'static str)] = &[];

    /// `(wire name, memory name)` pairs re-keyed before reading a record.
    const WIRE_QUIRKS: &'static [(&'static str, &'static str)] = &[];

    /// Fields whose values identify a record within its workgroup.
    const UNIQUENESS_FIELDS: &'static [&'static str] = &["name"];

    /// Server assigned identifier, absent before creation.
    fn id(&self) -> Option<IsogeoUuid>;

    fn to_wire_full(&self) -> Result<Map<String, Value>, ModelError> {
        let value = serde_json::to_value(self).map_err(|source| ModelError::Serialize {
            kind: Self::KIND,
            source,
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ModelError::NotAnObject { kind: Self::KIND }),
        }
    }

    fn to_wire_creation(&self) -> Result<Map<String, Value>, ModelError> {
        let mut full = self.to_wire_full()?;
        let mut creation = Map::new();
        for field in Self::CREATION_FIELDS {
            let value = full.remove(*field).unwrap_or(Value::Null);
            let wire_name = Self::CREATION_RENAMES
                .iter()
                .find(|(memory, _)| memory == field)
                .map_or(*field, |(_, wire)| *wire);
            creation.insert(wire_name.to_string(), value);
        }
        Ok(creation)
    }

    fn from_wire(value: Value) -> Result<Self, ModelError> {
        let Value::Object(mut map) = value else {
            return Err(ModelError::NotAnObject { kind: Self::KIND });
        };
        for (wire, memory) in Self::WIRE_QUIRKS {
            if let Some(value) = map.remove(*wire) {
                map.insert(memory.to_string(), value);
            }
        }
        serde_json::from_value(Value::Object(map)).map_err(|source| ModelError::Deserialize {
            kind: Self::KIND,
            source,
        })
    }

    /// Key used to detect duplicates before creation.
    ///
    /// `None` when none of [Model::UNIQUENESS_FIELDS] has a value.
    fn uniqueness_key(&self) -> Option<String> {
        let full = self.to_wire_full().ok()?;
        uniqueness_key_of::<Self>(&full)
    }
}

/// Uniqueness key of a record given as a full projection or a wire listing item.
pub(crate) fn uniqueness_key_of<T: Model>(fields: &Map<String, Value>) -> Option<String> {
    let values = T::UNIQUENESS_FIELDS
        .iter()
        .map(|field| {
            let value = fields.get(*field).or_else(|| {
                // listing items come with wire names
                T::WIRE_QUIRKS
                    .iter()
                    .find(|(_, memory)| memory == field)
                    .and_then(|(wire, _)| fields.get(*wire))
            });
            value.and_then(Value::as_str).unwrap_or_default()
        })
        .collect::<Vec<_>>();

    if values.iter().all(|value| value.is_empty()) {
        return None;
    }
    Some(values.join(KEY_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::checker::MetadataType;

    fn assert_no_server_fields<T: Model>(record: &T) {
        let creation = record.to_wire_creation().unwrap();
        for key in creation.keys() {
            assert!(
                !key.starts_with('_'),
                "{} creation projection leaks {key}",
                T::KIND
            );
        }
        for field in T::CREATION_FIELDS {
            assert!(!field.starts_with('_'));
        }
    }

    #[test]
    fn creation_projections_exclude_server_fields() {
        let owner = Workgroup {
            id: Some("32f7e95ec4e94ca3bc1afda960003882".parse().unwrap()),
            code: Some("isogeo-test".to_string()),
            ..Default::default()
        };
        assert_no_server_fields(&Catalog {
            id: Some("d220a5fb5e8a4e6ea4bf5a3b5a4e9b57".parse().unwrap()),
            abilities: Some(vec!["catalog:edit".to_string()]),
            created: Some("2019-05-17T13:56:56.6162418+00:00".to_string()),
            name: Some("Roads".to_string()),
            owner: Some(owner),
            ..Default::default()
        });
        assert_no_server_fields(&Contact {
            id: Some("d220a5fb5e8a4e6ea4bf5a3b5a4e9b57".parse().unwrap()),
            name: Some("Jane".to_string()),
            ..Default::default()
        });
        assert_no_server_fields(&Keyword::default());
        assert_no_server_fields(&License::default());
        assert_no_server_fields(&Share::default());
        assert_no_server_fields(&Specification::default());
        assert_no_server_fields(&Metadata::default());
    }

    #[test]
    fn uniqueness_keys() {
        let catalog = Catalog {
            name: Some("Roads".to_string()),
            ..Default::default()
        };
        assert_eq!(catalog.uniqueness_key().as_deref(), Some("Roads"));

        let contact = Contact {
            name: Some("Jane".to_string()),
            email: Some("jane@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            contact.uniqueness_key().as_deref(),
            Some("Jane\u{1f}jane@example.com")
        );

        assert_eq!(Catalog::default().uniqueness_key(), None);

        let listing_item = json!({"_id": "d220a5fb5e8a4e6ea4bf5a3b5a4e9b57", "$text": "roads"});
        assert_eq!(
            uniqueness_key_of::<Keyword>(listing_item.as_object().unwrap()).as_deref(),
            Some("roads")
        );
    }

    #[test]
    fn from_wire_rejects_non_objects() {
        assert!(matches!(
            Catalog::from_wire(json!(["not", "a", "record"])),
            Err(ModelError::NotAnObject {
                kind: ResourceKind::Catalog
            })
        ));
    }

    fn text() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[A-Za-z0-9 éè_-]{0,16}")
    }

    fn uuid() -> impl Strategy<Value = Option<IsogeoUuid>> {
        proptest::option::of(any::<u128>().prop_map(|n| uuid::Uuid::from_u128(n).into()))
    }

    fn owner() -> impl Strategy<Value = Option<Workgroup>> {
        (uuid(), text()).prop_map(|(id, code)| {
            (id.is_some() || code.is_some()).then(|| Workgroup { id, code, ..Default::default() })
        })
    }

    fn tags() -> impl Strategy<Value = Option<BTreeMap<String, String>>> {
        proptest::option::of(proptest::collection::btree_map(
            "[a-z-]{1,8}:[a-z0-9-]{1,8}",
            "[A-Za-z0-9 ]{0,12}",
            0..4,
        ))
    }

    proptest! {
        #[test]
        fn catalog_round_trip(
            id in uuid(),
            name in text(),
            code in text(),
            scan in proptest::option::of(any::<bool>()),
            count in proptest::option::of(any::<i64>()),
            owner_code in text(),
        ) {
            let catalog = Catalog {
                id,
                name,
                code,
                scan,
                count,
                owner: owner_code.map(|code| Workgroup { code: Some(code), ..Default::default() }),
                ..Default::default()
            };
            let full = catalog.to_wire_full().unwrap();
            prop_assert_eq!(Catalog::from_wire(Value::Object(full)).unwrap(), catalog);
        }

        #[test]
        fn contact_round_trip(
            id in uuid(),
            name in text(),
            email in text(),
            phone in text(),
            organization in text(),
        ) {
            let contact = Contact { id, name, email, phone, organization, ..Default::default() };
            let full = contact.to_wire_full().unwrap();
            prop_assert_eq!(Contact::from_wire(Value::Object(full)).unwrap(), contact);
        }

        #[test]
        fn keyword_round_trip(id in uuid(), text in text(), code in text(), thesaurus in text()) {
            let keyword = Keyword {
                id,
                text,
                code,
                thesaurus: thesaurus.map(|code| Thesaurus { code: Some(code), ..Default::default() }),
                ..Default::default()
            };
            let full = keyword.to_wire_full().unwrap();
            prop_assert_eq!(Keyword::from_wire(Value::Object(full)).unwrap(), keyword);
        }

        #[test]
        fn metadata_round_trip(
            id in uuid(),
            title in text(),
            r#abstract in text(),
            md_type in proptest::option::of(proptest::sample::select(MetadataType::ALL.to_vec())),
            scale in proptest::option::of(any::<i64>()),
            series in proptest::option::of(any::<bool>()),
            tags in tags(),
            epsg in proptest::option::of(any::<i64>()),
            creator in owner(),
        ) {
            let md = Metadata {
                id,
                title,
                r#abstract,
                md_type,
                scale,
                series,
                tags,
                coordinate_system: epsg.map(|code| CoordinateSystem { code: Some(code), ..Default::default() }),
                creator,
                ..Default::default()
            };
            let full = md.to_wire_full().unwrap();
            prop_assert_eq!(Metadata::from_wire(Value::Object(full)).unwrap(), md);
        }

        #[test]
        fn share_round_trip(
            id in uuid(),
            name in text(),
            share_type in proptest::option::of(proptest::sample::select(vec!["application", "group"])),
            rights in proptest::option::of(proptest::collection::vec("[a-z]{1,8}", 0..3)),
            url_token in text(),
            creator in owner(),
            catalog in text(),
        ) {
            let share = Share {
                id,
                name,
                share_type: share_type.map(str::to_string),
                rights,
                url_token,
                creator,
                catalogs: catalog.map(|name| vec![Catalog::new(name)]),
                ..Default::default()
            };
            let full = share.to_wire_full().unwrap();
            prop_assert_eq!(Share::from_wire(Value::Object(full)).unwrap(), share);
        }

        #[test]
        fn license_round_trip(
            id in uuid(),
            name in text(),
            content in text(),
            link in text(),
            count in proptest::option::of(any::<i64>()),
            owner in owner(),
        ) {
            let license = License { id, name, content, link, count, owner, ..Default::default() };
            let full = license.to_wire_full().unwrap();
            prop_assert_eq!(License::from_wire(Value::Object(full)).unwrap(), license);
        }

        #[test]
        fn specification_round_trip(
            id in uuid(),
            name in text(),
            link in text(),
            published in text(),
            count in proptest::option::of(any::<i64>()),
            owner in owner(),
        ) {
            let specification = Specification { id, name, link, published, count, owner, ..Default::default() };
            let full = specification.to_wire_full().unwrap();
            prop_assert_eq!(Specification::from_wire(Value::Object(full)).unwrap(), specification);
        }
    }
}
