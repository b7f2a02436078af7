//! Semantic search queries and search parameters.
//!
//! A semantic query is a whitespace separated list of tags
//! (`type:vector-dataset`, `keyword:isogeo:roads`...) and free text.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use derive_more::Deref;
use tracing::debug;

use crate::checker::{
    check_includes,
    check_specific_md,
    validate_enum_membership,
    CheckError,
    IncludeScope,
    Includes,
    IsogeoUuid,
    MetadataType,
};

pub const FILTER_ACTIONS: &[&str] = &["download", "other", "view"];
pub const FILTER_PROVIDERS: &[&str] = &["manual", "auto"];
pub const GEORELATIONS: &[&str] = &[
    "contains",
    "disjoint",
    "equal",
    "intersects",
    "overlaps",
    "within",
];
pub const ORDER_BY: &[&str] = &[
    "_created",
    "_modified",
    "title",
    "created",
    "modified",
    "relevance",
];
pub const ORDER_DIR: &[&str] = &["asc", "desc"];
pub const LANGS: &[&str] = &["en", "fr"];

/// Categories a query token is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterCategory {
    Action,
    Catalog,
    ContactGroup,
    Contact,
    CoordinateSystem,
    DataSource,
    Format,
    HasNo,
    KeywordInspireTheme,
    KeywordIsogeo,
    LicenseIsogeo,
    LicenseGroup,
    Owner,
    Provider,
    Share,
    Type,
    Text,
}

impl FilterCategory {
    /// Tag prefixes, most specific first.
    const PREFIXES: [(&'static str, FilterCategory); 16] = [
        ("action", FilterCategory::Action),
        ("catalog", FilterCategory::Catalog),
        ("contact:group", FilterCategory::ContactGroup),
        ("contact", FilterCategory::Contact),
        ("coordinate-system", FilterCategory::CoordinateSystem),
        ("data-source", FilterCategory::DataSource),
        ("format", FilterCategory::Format),
        ("has-no", FilterCategory::HasNo),
        ("keyword:inspire-theme", FilterCategory::KeywordInspireTheme),
        ("keyword:isogeo", FilterCategory::KeywordIsogeo),
        ("license:isogeo", FilterCategory::LicenseIsogeo),
        ("license", FilterCategory::LicenseGroup),
        ("owner", FilterCategory::Owner),
        ("provider", FilterCategory::Provider),
        ("share", FilterCategory::Share),
        ("type", FilterCategory::Type),
    ];

    /// Categories that may appear at most once in a query.
    const UNIQUE: [FilterCategory; 4] = [
        FilterCategory::CoordinateSystem,
        FilterCategory::Format,
        FilterCategory::Owner,
        FilterCategory::Type,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterCategory::Action => "action",
            FilterCategory::Catalog => "catalog",
            FilterCategory::ContactGroup => "contact:group",
            FilterCategory::Contact => "contact:isogeo",
            FilterCategory::CoordinateSystem => "coordinate-system",
            FilterCategory::DataSource => "data-source",
            FilterCategory::Format => "format",
            FilterCategory::HasNo => "has-no",
            FilterCategory::KeywordInspireTheme => "keyword:inspire-theme",
            FilterCategory::KeywordIsogeo => "keyword:isogeo",
            FilterCategory::LicenseIsogeo => "license:isogeo",
            FilterCategory::LicenseGroup => "license:group",
            FilterCategory::Owner => "owner",
            FilterCategory::Provider => "provider",
            FilterCategory::Share => "share",
            FilterCategory::Type => "type",
            FilterCategory::Text => "text",
        }
    }

    /// Sort a token into its category, returning the filter value.
    pub fn classify(token: &str) -> (FilterCategory, &str) {
        for (prefix, category) in Self::PREFIXES {
            if let Some(value) = token
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix(':'))
            {
                return (category, value);
            }
        }
        (FilterCategory::Text, token)
    }
}

impl Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Filter values of a query, by category, in query order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct FilterBuckets(BTreeMap<FilterCategory, Vec<String>>);

impl FilterBuckets {
    pub fn values(&self, category: FilterCategory) -> &[String] {
        self.0.get(&category).map(Vec::as_slice).unwrap_or_default()
    }

    fn push(&mut self, category: FilterCategory, value: &str) {
        self.0.entry(category).or_default().push(value.to_string());
    }
}

/// Parse a semantic query into filter buckets.
///
/// Fails if a single-valued filter is repeated, or if a `type`, `action`
/// or `provider` value is unknown.
pub fn normalize_query(query: &str) -> Result<FilterBuckets, CheckError> {
    let mut buckets = FilterBuckets::default();
    for token in query.split_whitespace() {
        let (category, value) = FilterCategory::classify(token);
        buckets.push(category, value);
    }

    for category in FilterCategory::UNIQUE {
        let count = buckets.values(category).len();
        if count > 1 {
            return Err(CheckError::DuplicateFilter {
                filter: category.to_string(),
                count,
            });
        }
    }

    let types = MetadataType::filter_forms();
    for value in buckets.values(FilterCategory::Type) {
        validate_enum_membership(value, &types, "type")?;
    }
    for value in buckets.values(FilterCategory::Action) {
        validate_enum_membership(value, FILTER_ACTIONS, "action")?;
    }
    for value in buckets.values(FilterCategory::Provider) {
        validate_enum_membership(value, FILTER_PROVIDERS, "provider")?;
    }

    debug!(?buckets, "query normalized");
    Ok(buckets)
}

/// Parameters of a metadata search (`resources/search`).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParameters {
    /// Semantic query.
    pub query: String,
    /// Bounding box in WGS84: `[xmin, ymin, xmax, ymax]`.
    pub bbox: Option<[f64; 4]>,
    /// Geometry in WKT.
    pub geo: Option<String>,
    /// Spatial relation applied to `bbox` or `geo`.
    pub rel: Option<String>,
    pub order_by: String,
    pub order_dir: String,
    pub page_size: u64,
    pub offset: u64,
    /// Restrict the search to a share.
    pub share: Option<IsogeoUuid>,
    /// Restrict the search to these metadata.
    pub specific_md: Vec<String>,
    pub include: Includes,
    pub lang: Option<String>,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            query: String::new(),
            bbox: None,
            geo: None,
            rel: None,
            order_by: "_created".to_string(),
            order_dir: "desc".to_string(),
            page_size: 20,
            offset: 0,
            share: None,
            specific_md: Vec::new(),
            include: Includes::None,
            lang: None,
        }
    }
}

impl SearchParameters {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Check the query and the other parameters before sending them.
    pub fn check(&self) -> Result<FilterBuckets, CheckError> {
        let buckets = normalize_query(&self.query)?;

        if let Some(rel) = &self.rel {
            if self.bbox.is_none() && self.geo.is_none() {
                return Err(CheckError::InvalidCombination(
                    "'rel' can't be used without 'box' or 'geo'".to_string(),
                ));
            }
            validate_enum_membership(rel, GEORELATIONS, "geographic relation")?;
        }
        validate_enum_membership(&self.order_by, ORDER_BY, "sorting field")?;
        validate_enum_membership(&self.order_dir, ORDER_DIR, "sorting direction")?;
        if let Some(lang) = &self.lang {
            validate_enum_membership(lang, LANGS, "language")?;
        }
        Ok(buckets)
    }

    /// Query string pairs, named as the API expects them.
    pub fn to_query_pairs(&self) -> Result<Vec<(&'static str, String)>, CheckError> {
        let mut pairs = vec![
            ("_limit", self.page_size.to_string()),
            ("_offset", self.offset.to_string()),
            ("ob", self.order_by.clone()),
            ("od", self.order_dir.clone()),
        ];
        if !self.query.is_empty() {
            pairs.push(("q", self.query.clone()));
        }
        let specific_md = check_specific_md(&self.specific_md);
        if !specific_md.is_empty() {
            pairs.push(("_id", specific_md));
        }
        let include = check_includes(&self.include, Some(IncludeScope::Metadata))?;
        if !include.is_empty() {
            pairs.push(("_include", include));
        }
        if let Some(bbox) = self.bbox {
            pairs.push(("box", bbox.map(|c| c.to_string()).join(",")));
        }
        if let Some(geo) = &self.geo {
            pairs.push(("geo", geo.clone()));
        }
        if let Some(rel) = &self.rel {
            pairs.push(("rel", rel.clone()));
        }
        if let Some(share) = self.share {
            pairs.push(("s", share.simple()));
        }
        if let Some(lang) = &self.lang {
            pairs.push(("_lang", lang.clone()));
        }
        Ok(pairs)
    }
}
