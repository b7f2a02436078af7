//! Checks applied to caller input before anything is sent to the API.
//!
//! Every function here is pure: no request is issued, so a failing check
//! never costs a round-trip (or a token refresh).

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

/// Marker of the platform specific URN used in Isogeo XML exports.
const PLATFORM_MARKER: &str = "isogeo:metadata";
const URN_PREFIX: &str = "urn:uuid:";
const PLATFORM_URN_PREFIX: &str = "urn:isogeo:metadata:uuid:";

/// Errors raised by input checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("'{0}' is not a valid Isogeo UUID")]
    InvalidIdentifier(String),
    #[error(
        "'{value}' is not a valid {what}. Available values: {}",
        fmt_allowed(.allowed)
    )]
    InvalidValue {
        what: String,
        value: String,
        allowed: Vec<String>,
    },
    #[error("query filter '{filter}' must be unique but it occurred {count} times")]
    DuplicateFilter { filter: String, count: usize },
    #[error("{0}")]
    InvalidCombination(String),
}

impl CheckError {
    pub(crate) fn invalid_value(
        what: impl Into<String>,
        value: impl Into<String>,
        allowed: &[&str],
    ) -> Self {
        CheckError::InvalidValue {
            what: what.into(),
            value: value.into(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn fmt_allowed(allowed: &[String]) -> String {
    if allowed.is_empty() {
        "none".to_string()
    } else {
        allowed.join(" | ")
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// A resource identifier.
///
/// Parses the plain hexadecimal form (hyphens optional), the RFC4122 URN
/// (`urn:uuid:...`) and the platform URN (`urn:isogeo:metadata:uuid:...`).
/// Always renders as 32 lowercase hex characters, which is what the API
/// expects in routes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct IsogeoUuid(Uuid);

impl IsogeoUuid {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Canonical form: 32 lowercase hex characters.
    pub fn simple(&self) -> String {
        self.0.simple().to_string()
    }

    /// RFC4122 URN form, `urn:uuid:<hyphenated>`.
    pub fn urn(&self) -> String {
        self.0.urn().to_string()
    }

    /// Platform URN form used in XML exports.
    pub fn platform_urn(&self) -> String {
        format!("{PLATFORM_URN_PREFIX}{}", self.0.hyphenated())
    }
}

impl Display for IsogeoUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for IsogeoUuid {
    type Err = CheckError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let text = if value.contains(PLATFORM_MARKER) {
            value.rsplit(':').next().unwrap_or(value)
        } else {
            value.strip_prefix(URN_PREFIX).unwrap_or(value)
        };

        let invalid = || CheckError::InvalidIdentifier(value.to_string());
        let uuid = Uuid::try_parse(text).map_err(|_| invalid())?;

        // `Uuid::try_parse` also accepts braced and URN renderings. Only the
        // plain and hyphenated hex forms are allowed past the prefix, so the
        // remaining text must reduce to the canonical hex.
        let canonical = uuid.simple().to_string();
        if text.replace('-', "").to_ascii_lowercase() != canonical {
            return Err(invalid());
        }

        Ok(Self(uuid))
    }
}

impl From<Uuid> for IsogeoUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Returns the canonical hex form of an identifier, or `None` if malformed.
pub fn canonical_identifier(value: &str) -> Option<String> {
    value.parse::<IsogeoUuid>().ok().map(|uuid| uuid.simple())
}

/// Check whether `value` is a valid identifier in any accepted form.
///
/// Never fails: malformed input yields `false`.
pub fn is_valid_identifier(value: &str) -> bool {
    match value.parse::<IsogeoUuid>() {
        Ok(_) => true,
        Err(err) => {
            debug!(%err, "identifier check failed");
            false
        },
    }
}

/// Keep the valid metadata identifiers and join them for the `_id` parameter.
///
/// Invalid identifiers are dropped and logged.
pub fn check_specific_md(ids: &[impl AsRef<str>]) -> String {
    ids.iter()
        .filter_map(|id| match id.as_ref().parse::<IsogeoUuid>() {
            Ok(uuid) => Some(uuid.simple()),
            Err(_) => {
                error!(id = id.as_ref(), "metadata UUID is not correct, ignoring it");
                None
            },
        })
        .collect::<Vec<_>>()
        .join(",")
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Case-insensitive membership test.
pub fn is_enum_member(value: &str, allowed: &[&str]) -> bool {
    allowed
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(value))
}

/// Case-insensitive membership check that reports the allowed values.
///
/// An empty `allowed` set never validates anything.
pub fn validate_enum_membership(value: &str, allowed: &[&str], what: &str) -> Result<(), CheckError> {
    if allowed.is_empty() || !is_enum_member(value, allowed) {
        return Err(CheckError::invalid_value(what, value, allowed));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Metadata types and edition tabs
// ---------------------------------------------------------------------------

/// Type of a metadata record.
///
/// The API is not consistent here: query filters use the hyphenated form
/// (`vector-dataset`) while record details use camelCase (`vectorDataset`).
/// Serialized in the detail form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataType {
    Dataset,
    RasterDataset,
    VectorDataset,
    Resource,
    Service,
}

impl MetadataType {
    pub const ALL: [MetadataType; 5] = [
        MetadataType::Dataset,
        MetadataType::RasterDataset,
        MetadataType::VectorDataset,
        MetadataType::Resource,
        MetadataType::Service,
    ];

    /// Hyphenated spelling used in query filters.
    pub fn filter_form(self) -> &'static str {
        match self {
            MetadataType::Dataset => "dataset",
            MetadataType::RasterDataset => "raster-dataset",
            MetadataType::VectorDataset => "vector-dataset",
            MetadataType::Resource => "resource",
            MetadataType::Service => "service",
        }
    }

    /// camelCase spelling used in record details.
    pub fn detail_form(self) -> &'static str {
        match self {
            MetadataType::Dataset => "dataset",
            MetadataType::RasterDataset => "rasterDataset",
            MetadataType::VectorDataset => "vectorDataset",
            MetadataType::Resource => "resource",
            MetadataType::Service => "service",
        }
    }

    pub fn filter_forms() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.filter_form()).collect()
    }
}

impl FromStr for MetadataType {
    type Err = CheckError;

    /// Accepts either spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.filter_form() == s || t.detail_form() == s)
            .ok_or_else(|| CheckError::invalid_value("metadata type", s, &Self::filter_forms()))
    }
}

impl Display for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filter_form())
    }
}

/// Convert a metadata type name between its filter and detail spellings.
///
/// `vector-dataset` becomes `vectorDataset` and the other way round. Names
/// that are identical in both vocabularies are returned unchanged.
pub fn convert_md_type(name: &str) -> Result<&'static str, CheckError> {
    let md_type = name.parse::<MetadataType>()?;
    if md_type.filter_form() == name {
        Ok(md_type.detail_form())
    } else {
        Ok(md_type.filter_form())
    }
}

/// Tabs of the metadata edition form of the web application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditTab {
    Identification,
    History,
    Geography,
    Quality,
    Attributes,
    Constraints,
    Resources,
    Contacts,
    Advanced,
    Metadata,
}

impl EditTab {
    pub const ALL: [EditTab; 10] = [
        EditTab::Identification,
        EditTab::History,
        EditTab::Geography,
        EditTab::Quality,
        EditTab::Attributes,
        EditTab::Constraints,
        EditTab::Resources,
        EditTab::Contacts,
        EditTab::Advanced,
        EditTab::Metadata,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EditTab::Identification => "identification",
            EditTab::History => "history",
            EditTab::Geography => "geography",
            EditTab::Quality => "quality",
            EditTab::Attributes => "attributes",
            EditTab::Constraints => "constraints",
            EditTab::Resources => "resources",
            EditTab::Contacts => "contacts",
            EditTab::Advanced => "advanced",
            EditTab::Metadata => "metadata",
        }
    }

    /// Metadata types this tab is shown for.
    pub fn supported_types(self) -> &'static [MetadataType] {
        use MetadataType::*;
        match self {
            EditTab::Geography | EditTab::Quality => {
                &[Dataset, RasterDataset, VectorDataset, Service]
            },
            EditTab::Attributes => &[VectorDataset],
            _ => &MetadataType::ALL,
        }
    }

    pub fn supports(self, md_type: MetadataType) -> bool {
        self.supported_types().contains(&md_type)
    }
}

impl FromStr for EditTab {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| {
                let allowed = Self::ALL.map(EditTab::as_str);
                CheckError::invalid_value("edition tab", s, &allowed)
            })
    }
}

impl Display for EditTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check that an edition tab exists for a metadata type.
///
/// `md_type` may be spelled either way (`vector-dataset` or `vectorDataset`).
pub fn validate_tab_for_type(tab: &str, md_type: &str) -> Result<(EditTab, MetadataType), CheckError> {
    let tab = tab.parse::<EditTab>()?;
    let md_type = md_type.parse::<MetadataType>()?;

    if !tab.supports(md_type) {
        let allowed = tab
            .supported_types()
            .iter()
            .map(|t| t.filter_form())
            .collect::<Vec<_>>();
        return Err(CheckError::InvalidValue {
            what: format!("metadata type for the '{tab}' tab"),
            value: md_type.filter_form().to_string(),
            allowed: allowed.into_iter().map(String::from).collect(),
        });
    }
    Ok((tab, md_type))
}

// ---------------------------------------------------------------------------
// Includes and subresources
// ---------------------------------------------------------------------------

/// Subresources that can be embedded in metadata responses.
pub const SUBRESOURCES_MD: &[&str] = &[
    "_creator",
    "conditions",
    "contacts",
    "coordinate-system",
    "events",
    "feature-attributes",
    "keywords",
    "layers",
    "limitations",
    "links",
    "operations",
    "serviceLayers",
    "specifications",
    "tags",
];

/// Subresources that can be embedded in keyword responses.
pub const SUBRESOURCES_KW: &[&str] = &["_abilities", "count", "thesaurus"];

/// Subresources reachable through a dedicated route of a metadata.
const SUBRESOURCE_ROUTES: &[&str] = &[
    "conditions",
    "contacts",
    "coordinate-system",
    "events",
    "feature-attributes",
    "keywords",
    "layers",
    "limitations",
    "links",
    "operations",
    "specifications",
];

/// Which subresource vocabulary an `_include` parameter is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeScope {
    Metadata,
    Keyword,
}

impl IncludeScope {
    pub fn subresources(self) -> &'static [&'static str] {
        match self {
            IncludeScope::Metadata => SUBRESOURCES_MD,
            IncludeScope::Keyword => SUBRESOURCES_KW,
        }
    }
}

/// Subresources the server should embed in a response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Includes {
    /// Every subresource of the scope.
    All,
    List(Vec<String>),
    #[default]
    None,
}

impl Includes {
    pub fn of<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Includes::List(items.into_iter().map(Into::into).collect())
    }
}

/// Render an `_include` parameter value.
///
/// With a scope, listed subresources must belong to it and [Includes::All]
/// expands to the whole vocabulary. Without a scope, lists are passed
/// through and [Includes::All] is rejected.
pub fn check_includes(includes: &Includes, scope: Option<IncludeScope>) -> Result<String, CheckError> {
    match (includes, scope) {
        (Includes::None, _) => Ok(String::new()),
        (Includes::All, Some(scope)) => Ok(scope.subresources().join(",")),
        (Includes::All, None) => Err(CheckError::invalid_value(
            "include",
            "all",
            &[],
        )),
        (Includes::List(items), Some(scope)) => {
            for item in items {
                validate_enum_membership(item, scope.subresources(), "subresource")?;
            }
            Ok(items.join(","))
        },
        (Includes::List(items), None) => Ok(items.join(",")),
    }
}

/// Resolve a subresource route name, accepting the legacy include names.
pub fn check_subresource(subresource: &str) -> Result<&'static str, CheckError> {
    let resolved = match subresource {
        "tags" => "keywords",
        "serviceLayers" => "layers",
        other => other,
    };
    if resolved != subresource {
        debug!(
            subresource,
            resolved, "include name used as subresource, renamed"
        );
    }
    SUBRESOURCE_ROUTES
        .iter()
        .copied()
        .find(|candidate| *candidate == resolved)
        .ok_or_else(|| CheckError::invalid_value("subresource", subresource, SUBRESOURCE_ROUTES))
}
