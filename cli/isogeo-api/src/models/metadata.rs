use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use super::{Keyword, Model, ResourceKind, Workgroup};
use crate::checker::{validate_tab_for_type, CheckError, IsogeoUuid, MetadataType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    #[serde(rename = "_tag")]
    pub tag: Option<String>,
    pub alias: Option<String>,
    /// EPSG code.
    pub code: Option<i64>,
    pub name: Option<String>,
}

/// Attribute of a vector dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAttribute {
    #[serde(rename = "_id")]
    pub id: Option<IsogeoUuid>,
    pub alias: Option<String>,
    pub comment: Option<String>,
    pub data_type: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub length: Option<i64>,
    pub name: Option<String>,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
}

/// A metadata record (a "resource" in API routes).
///
/// `coordinateSystem` and `featureAttributes` are hyphenated on the wire
/// (`coordinate-system`, `feature-attributes`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(rename = "_abilities")]
    pub abilities: Option<Vec<String>>,
    #[serde(rename = "_created")]
    pub created_at: Option<String>,
    #[serde(rename = "_creator")]
    pub creator: Option<Workgroup>,
    #[serde(rename = "_id")]
    pub id: Option<IsogeoUuid>,
    #[serde(rename = "_modified")]
    pub modified_at: Option<String>,
    #[serde(rename = "abstract")]
    pub r#abstract: Option<String>,
    pub collection_context: Option<String>,
    pub collection_method: Option<String>,
    pub conditions: Option<Vec<Value>>,
    pub contacts: Option<Vec<Value>>,
    #[serde(alias = "coordinate-system")]
    pub coordinate_system: Option<CoordinateSystem>,
    /// Creation date of the data.
    pub created: Option<String>,
    pub distance: Option<f64>,
    pub edition_profile: Option<String>,
    pub encoding: Option<String>,
    /// GeoJSON geometry of the data extent.
    pub envelope: Option<Map<String, Value>>,
    pub events: Option<Vec<Value>>,
    #[serde(alias = "feature-attributes")]
    pub feature_attributes: Option<Vec<FeatureAttribute>>,
    pub features: Option<i64>,
    pub format: Option<String>,
    pub format_version: Option<String>,
    pub geometry: Option<String>,
    pub keywords: Option<Vec<Keyword>>,
    pub language: Option<String>,
    pub limitations: Option<Vec<Value>>,
    pub links: Option<Vec<Value>>,
    /// Last modification date of the data.
    pub modified: Option<String>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub precision: Option<String>,
    pub published: Option<String>,
    pub scale: Option<i64>,
    pub series: Option<bool>,
    pub service_layers: Option<Vec<Value>>,
    pub specifications: Option<Vec<Value>>,
    /// Labels by tag, e.g. `"format:shp": "ESRI Shapefile"`.
    pub tags: Option<BTreeMap<String, String>>,
    pub title: Option<String>,
    pub topological_consistency: Option<String>,
    #[serde(rename = "type")]
    pub md_type: Option<MetadataType>,
    pub update_frequency: Option<String>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
    pub validity_comment: Option<String>,
}

impl Metadata {
    pub fn new(md_type: MetadataType, title: impl Into<String>) -> Self {
        Self {
            md_type: Some(md_type),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Workgroup owning the metadata.
    pub fn owner(&self) -> Option<IsogeoUuid> {
        self.creator.as_ref()?.id
    }

    /// Title, falling back to the technical name.
    pub fn title_or_name(&self) -> Option<&str> {
        self.title.as_deref().or(self.name.as_deref())
    }

    /// URL of the edition form of this metadata in the web application.
    ///
    /// `None` when the record lacks its identifier, owner or type.
    pub fn admin_url(&self, app_url: &Url, tab: &str) -> Result<Option<Url>, CheckError> {
        let (Some(id), Some(owner), Some(md_type)) = (self.id, self.owner(), self.md_type) else {
            return Ok(None);
        };
        let (tab, _) = validate_tab_for_type(tab, md_type.detail_form())?;
        let path = format!("groups/{owner}/resources/{id}/{tab}");
        Ok(app_url.join(&path).ok())
    }
}

impl Model for Metadata {
    const KIND: ResourceKind = ResourceKind::Metadata;
    const CREATION_FIELDS: &'static [&'static str] = &[
        "abstract",
        "collectionContext",
        "encoding",
        "format",
        "formatVersion",
        "language",
        "path",
        "precision",
        "scale",
        "series",
        "title",
        "topologicalConsistency",
        "type",
    ];
    const WIRE_QUIRKS: &'static [(&'static str, &'static str)] = &[
        ("coordinate-system", "coordinateSystem"),
        ("feature-attributes", "featureAttributes"),
    ];
    const UNIQUENESS_FIELDS: &'static [&'static str] = &["title"];

    fn id(&self) -> Option<IsogeoUuid> {
        self.id
    }
}
