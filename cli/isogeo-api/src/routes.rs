//! Route families of the resources handled by [crate::IsogeoClient].

use serde_json::Value;

use crate::checker::{CheckError, IncludeScope, IsogeoUuid};
use crate::models::{Catalog, Contact, Keyword, License, Metadata, Model, Share, Specification};

/// Where a resource lives in the API.
///
/// `parent` is the workgroup owning the resource, or the thesaurus for
/// keywords.
pub trait ApiResource: Model {
    /// Subresources accepted in `_include`, `None` to pass them through.
    const INCLUDE_SCOPE: Option<IncludeScope> = None;

    /// Whether listings are search pages, read with `_limit` and `_offset`
    /// until the announced total is reached.
    const PAGED_LISTING: bool = false;

    /// Route creations are posted to.
    fn collection_route(parent: IsogeoUuid) -> String;

    fn listing_route(parent: IsogeoUuid) -> String {
        Self::collection_route(parent)
    }

    /// Route to read and update one resource.
    fn item_route(parent: Option<IsogeoUuid>, id: IsogeoUuid) -> Result<String, CheckError>;

    fn delete_route(parent: IsogeoUuid, id: IsogeoUuid) -> String {
        format!("{}/{id}", Self::collection_route(parent))
    }

    /// Parent of a record as returned by the API.
    fn parent_of(&self) -> Option<IsogeoUuid>;

    /// Records of a listing response.
    fn listing_items(body: Value) -> Option<Vec<Value>> {
        match body {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Records of a search page, `{"total": .., "results": [..]}`.
fn search_results(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Object(mut page) => match page.remove("results") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn require_parent<T: Model>(parent: Option<IsogeoUuid>) -> Result<IsogeoUuid, CheckError> {
    parent.ok_or_else(|| {
        CheckError::InvalidCombination(format!("a {} route needs its parent identifier", T::KIND))
    })
}

impl ApiResource for Catalog {
    fn collection_route(parent: IsogeoUuid) -> String {
        format!("groups/{parent}/catalogs")
    }

    fn item_route(parent: Option<IsogeoUuid>, id: IsogeoUuid) -> Result<String, CheckError> {
        let parent = require_parent::<Self>(parent)?;
        Ok(format!("groups/{parent}/catalogs/{id}"))
    }

    fn parent_of(&self) -> Option<IsogeoUuid> {
        self.owner.as_ref()?.id
    }
}

impl ApiResource for License {
    fn collection_route(parent: IsogeoUuid) -> String {
        format!("groups/{parent}/licenses")
    }

    fn item_route(_parent: Option<IsogeoUuid>, id: IsogeoUuid) -> Result<String, CheckError> {
        Ok(format!("licenses/{id}"))
    }

    fn parent_of(&self) -> Option<IsogeoUuid> {
        self.owner.as_ref()?.id
    }
}

impl ApiResource for Contact {
    fn collection_route(parent: IsogeoUuid) -> String {
        format!("groups/{parent}/contacts")
    }

    fn item_route(_parent: Option<IsogeoUuid>, id: IsogeoUuid) -> Result<String, CheckError> {
        Ok(format!("contacts/{id}"))
    }

    fn parent_of(&self) -> Option<IsogeoUuid> {
        None
    }
}

impl ApiResource for Specification {
    fn collection_route(parent: IsogeoUuid) -> String {
        format!("groups/{parent}/specifications")
    }

    fn item_route(parent: Option<IsogeoUuid>, id: IsogeoUuid) -> Result<String, CheckError> {
        let parent = require_parent::<Self>(parent)?;
        Ok(format!("groups/{parent}/specifications/{id}"))
    }

    fn parent_of(&self) -> Option<IsogeoUuid> {
        self.owner.as_ref()?.id
    }
}

impl ApiResource for Share {
    fn collection_route(parent: IsogeoUuid) -> String {
        format!("groups/{parent}/shares")
    }

    fn item_route(_parent: Option<IsogeoUuid>, id: IsogeoUuid) -> Result<String, CheckError> {
        Ok(format!("shares/{id}"))
    }

    fn delete_route(_parent: IsogeoUuid, id: IsogeoUuid) -> String {
        format!("shares/{id}")
    }

    fn parent_of(&self) -> Option<IsogeoUuid> {
        self.owner()
    }
}

impl ApiResource for Keyword {
    const INCLUDE_SCOPE: Option<IncludeScope> = Some(IncludeScope::Keyword);
    const PAGED_LISTING: bool = true;

    fn collection_route(parent: IsogeoUuid) -> String {
        format!("thesauri/{parent}/keywords")
    }

    fn listing_route(parent: IsogeoUuid) -> String {
        format!("thesauri/{parent}/keywords/search")
    }

    fn item_route(_parent: Option<IsogeoUuid>, id: IsogeoUuid) -> Result<String, CheckError> {
        Ok(format!("keywords/{id}"))
    }

    fn parent_of(&self) -> Option<IsogeoUuid> {
        self.thesaurus.as_ref()?.id
    }

    fn listing_items(body: Value) -> Option<Vec<Value>> {
        search_results(body)
    }
}

impl ApiResource for Metadata {
    const INCLUDE_SCOPE: Option<IncludeScope> = Some(IncludeScope::Metadata);
    const PAGED_LISTING: bool = true;

    fn collection_route(parent: IsogeoUuid) -> String {
        format!("groups/{parent}/resources")
    }

    fn listing_route(parent: IsogeoUuid) -> String {
        format!("groups/{parent}/resources/search")
    }

    fn item_route(_parent: Option<IsogeoUuid>, id: IsogeoUuid) -> Result<String, CheckError> {
        Ok(format!("resources/{id}"))
    }

    fn delete_route(_parent: IsogeoUuid, id: IsogeoUuid) -> String {
        format!("resources/{id}")
    }

    fn parent_of(&self) -> Option<IsogeoUuid> {
        self.owner()
    }

    fn listing_items(body: Value) -> Option<Vec<Value>> {
        search_results(body)
    }
}
