use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Keyword, Metadata};

/// Page of a metadata search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSearch {
    pub envelope: Option<Value>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Query as understood by the API.
    pub query: Option<Value>,
    #[serde(default)]
    pub results: Vec<Metadata>,
    /// Facets of the matching metadata, tag to label.
    pub tags: Option<Value>,
    #[serde(default)]
    pub total: u64,
}

/// Page of a keyword search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordSearch {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    #[serde(default)]
    pub results: Vec<Keyword>,
    #[serde(default)]
    pub total: u64,
}
