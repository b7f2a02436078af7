//! Isogeo API client.
//!
//! Every operation checks its input first, then obtains a fresh bearer from
//! the [TokenManager], then sends the request. Nothing reaches the network
//! when a check fails.

use std::fmt::Debug;
use std::future::{ready, Future};
use std::str::FromStr;

use async_stream::try_stream;
use futures::stream::Stream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{self, HeaderMap};
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::auth::{OAuthTokenIssuer, TokenIssuer, TokenManager};
use crate::cache::NameCache;
use crate::checker::{check_includes, CheckError, Includes, IsogeoUuid};
use crate::config::{IsogeoClientConfig, DEFAULT_USER_AGENT};
use crate::error::{check_api_response, IsogeoClientError};
use crate::models::{uniqueness_key_of, KeywordSearch, Metadata, Model, ResourceSearch};
use crate::query::SearchParameters;
use crate::routes::ApiResource;

/// Largest page the search route serves.
pub const SEARCH_PAGE_SIZE: u64 = 100;

/// Outcome of a creation.
#[derive(Debug, Clone, PartialEq)]
pub enum Created<T> {
    New(T),
    /// A resource with the same name already exists; nothing was created.
    AlreadyExists { id: IsogeoUuid },
}

impl<T> Created<T> {
    pub fn is_new(&self) -> bool {
        matches!(self, Created::New(_))
    }
}

/// Whether to look for a resource with the same name before creating one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistenceCheck {
    Skip,
    #[default]
    Check,
}

impl TryFrom<u8> for ExistenceCheck {
    type Error = CheckError;

    /// Integer modes: `0` skips the check, `1` and `2` check.
    fn try_from(mode: u8) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(ExistenceCheck::Skip),
            1 | 2 => Ok(ExistenceCheck::Check),
            other => Err(CheckError::invalid_value(
                "existence check mode",
                other.to_string(),
                &["0", "1", "2"],
            )),
        }
    }
}

/// A client for the Isogeo API, scoped to one authenticated session.
pub struct IsogeoClient<I = OAuthTokenIssuer> {
    http: reqwest::Client,
    config: IsogeoClientConfig,
    api_url: Url,
    tokens: TokenManager<I>,
    cache: NameCache,
}

impl<I> Debug for IsogeoClient<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsogeoClient")
            .field("api_url", &self.api_url.as_str())
            .field("client_id", &self.config.credentials.client_id())
            .finish_non_exhaustive()
    }
}

impl IsogeoClient<OAuthTokenIssuer> {
    /// Create a client authenticating against the identity service of the
    /// configured platform.
    pub fn new(config: IsogeoClientConfig) -> Result<Self, IsogeoClientError> {
        let http = build_http_client(&config)?;
        let id_url = config
            .id_url()
            .map_err(|e| IsogeoClientError::Other(e.to_string()))?;
        let issuer = OAuthTokenIssuer::new(http.clone(), id_url);
        Self::from_parts(config, http, issuer)
    }
}

impl<I: TokenIssuer> IsogeoClient<I> {
    /// Create a client obtaining its tokens from `issuer`.
    pub fn with_issuer(config: IsogeoClientConfig, issuer: I) -> Result<Self, IsogeoClientError> {
        let http = build_http_client(&config)?;
        Self::from_parts(config, http, issuer)
    }

    fn from_parts(
        config: IsogeoClientConfig,
        http: reqwest::Client,
        issuer: I,
    ) -> Result<Self, IsogeoClientError> {
        let mut api_url = config
            .api_url()
            .map_err(|e| IsogeoClientError::Other(e.to_string()))?;
        // routes are joined to the base, which must end with a slash
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        let tokens = TokenManager::new(issuer, config.credentials.clone())
            .with_margin(config.token_margin);

        Ok(Self {
            http,
            config,
            api_url,
            tokens,
            cache: NameCache::new(),
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn config(&self) -> &IsogeoClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenManager<I> {
        &self.tokens
    }

    /// Names of the resources seen during this session.
    pub fn cache(&self) -> &NameCache {
        &self.cache
    }

    /// Authenticate now rather than on the first request.
    pub async fn connect(&self) -> Result<(), IsogeoClientError> {
        self.tokens.bearer().await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    /// List the resources of a workgroup (or of a thesaurus for keywords).
    ///
    /// With `caching`, the names of the listed resources are kept for the
    /// existence checks of later creations.
    #[instrument(skip(self, include), fields(kind = %T::KIND))]
    pub async fn list<T: ApiResource>(
        &self,
        parent: &str,
        include: &Includes,
        caching: bool,
    ) -> Result<Vec<T>, IsogeoClientError> {
        let parent = IsogeoUuid::from_str(parent)?;
        let include = check_includes(include, T::INCLUDE_SCOPE)?;

        let items = self.list_raw::<T>(parent, include).await?;
        if caching {
            self.cache
                .record_listing(parent, T::KIND, names_of::<T>(&items));
        }

        let records = items
            .into_iter()
            .map(T::from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "listed resources");
        Ok(records)
    }

    /// Read a resource. `parent` is only needed by workgroup scoped routes.
    #[instrument(skip(self, include), fields(kind = %T::KIND))]
    pub async fn get<T: ApiResource>(
        &self,
        parent: Option<&str>,
        id: &str,
        include: &Includes,
    ) -> Result<T, IsogeoClientError> {
        let parent = parent.map(IsogeoUuid::from_str).transpose()?;
        let id = IsogeoUuid::from_str(id)?;
        let include = check_includes(include, T::INCLUDE_SCOPE)?;
        let route = T::item_route(parent, id)?;

        let resp = self
            .send(Method::GET, &route, &self.read_params(include), None)
            .await?;
        Ok(T::from_wire(read_json(resp).await?)?)
    }

    /// Create a resource.
    ///
    /// With [ExistenceCheck::Check], the names of the parent's resources
    /// are listed once per session and a resource with the same uniqueness
    /// key is returned as [Created::AlreadyExists] without being created.
    #[instrument(skip(self, record), fields(kind = %T::KIND))]
    pub async fn create<T: ApiResource>(
        &self,
        parent: &str,
        record: &T,
        check: ExistenceCheck,
    ) -> Result<Created<T>, IsogeoClientError> {
        let parent = IsogeoUuid::from_str(parent)?;
        let body = Value::Object(record.to_wire_creation()?);
        let key = record.uniqueness_key();

        if let (ExistenceCheck::Check, Some(key)) = (check, &key) {
            self.cache
                .ensure_populated(parent, T::KIND, || async {
                    let items = self.list_raw::<T>(parent, String::new()).await?;
                    Ok::<_, IsogeoClientError>(names_of::<T>(&items))
                })
                .await?;
            if let Some(id) = self.cache.lookup_by_name(parent, T::KIND, key) {
                debug!(%id, "resource already exists, not created");
                return Ok(Created::AlreadyExists { id });
            }
        }

        let resp = self
            .send(Method::POST, &T::collection_route(parent), &[], Some(&body))
            .await?;
        let created = T::from_wire(read_json(resp).await?)?;

        if let (Some(key), Some(id)) = (created.uniqueness_key().or(key), created.id()) {
            self.cache.record_created(parent, T::KIND, key, id);
        }
        debug!(id = ?created.id(), "resource created");
        Ok(Created::New(created))
    }

    /// Replace a resource with `record`, which must carry its identifier.
    #[instrument(skip(self, record), fields(kind = %T::KIND))]
    pub async fn update<T: ApiResource>(
        &self,
        record: &T,
        caching: bool,
    ) -> Result<T, IsogeoClientError> {
        let id = record.id().ok_or_else(|| {
            CheckError::InvalidCombination(format!("a {} must have an identifier to be updated", T::KIND))
        })?;
        let parent = record.parent_of();
        let route = T::item_route(parent, id)?;
        let body = Value::Object(record.to_wire_full()?);

        let resp = self.send(Method::PUT, &route, &[], Some(&body)).await?;
        let updated = T::from_wire(read_json(resp).await?)?;

        if caching {
            if let (Some(parent), Some(key)) = (parent, updated.uniqueness_key()) {
                self.cache.record_renamed(parent, T::KIND, key, id);
            }
        }
        Ok(updated)
    }

    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn delete<T: ApiResource>(
        &self,
        parent: &str,
        id: &str,
    ) -> Result<(), IsogeoClientError> {
        let parent = IsogeoUuid::from_str(parent)?;
        let id = IsogeoUuid::from_str(id)?;
        self.send(Method::DELETE, &T::delete_route(parent, id), &[], None)
            .await?;
        Ok(())
    }

    /// Whether a resource exists. A 404 answer is not an error here.
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn exists<T: ApiResource>(
        &self,
        parent: Option<&str>,
        id: &str,
    ) -> Result<bool, IsogeoClientError> {
        let parent = parent.map(IsogeoUuid::from_str).transpose()?;
        let id = IsogeoUuid::from_str(id)?;
        let route = T::item_route(parent, id)?;

        match self.send(Method::GET, &route, &[], None).await {
            Ok(_) => Ok(true),
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Read a metadata with the given subresources.
    pub async fn metadata(&self, id: &str, include: &Includes) -> Result<Metadata, IsogeoClientError> {
        self.get::<Metadata>(None, id, include).await
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Search the metadata shared with the application, one page.
    #[instrument(skip(self, params), fields(query = %params.query))]
    pub async fn search(&self, params: &SearchParameters) -> Result<ResourceSearch, IsogeoClientError> {
        params.check()?;
        self.search_page(params).await
    }

    /// Search every matching metadata, paging through the results.
    ///
    /// Returns the total announced by the API and at most `limit` records.
    pub async fn search_all(
        &self,
        params: &SearchParameters,
        limit: Option<usize>,
    ) -> Result<(u64, Vec<Metadata>), IsogeoClientError> {
        params.check()?;
        let stream = make_depaging_stream(
            |offset, page_size| {
                let params = SearchParameters {
                    offset,
                    page_size,
                    ..params.clone()
                };
                async move {
                    let page = self.search_page(&params).await?;
                    Ok::<_, IsogeoClientError>((page.total, page.results))
                }
            },
            SEARCH_PAGE_SIZE,
        );
        collect_search_results(stream, limit).await
    }

    /// Search the keywords of a thesaurus.
    #[instrument(skip(self))]
    pub async fn search_keywords(
        &self,
        thesaurus: &str,
        query: &str,
        page_size: u64,
        offset: u64,
    ) -> Result<KeywordSearch, IsogeoClientError> {
        let thesaurus = IsogeoUuid::from_str(thesaurus)?;
        let mut params = self.read_params(String::new());
        params.extend([
            ("_limit", page_size.to_string()),
            ("_offset", offset.to_string()),
        ]);
        if !query.is_empty() {
            params.push(("q", query.to_string()));
        }
        let route = format!("thesauri/{thesaurus}/keywords/search");
        let resp = self.send(Method::GET, &route, &params, None).await?;
        serde_json::from_value(read_json(resp).await?)
            .map_err(|e| IsogeoClientError::InvalidResponse {
                url: route,
                message: e.to_string(),
            })
    }

    /// Version of the API. Does not need authentication.
    pub async fn api_version(&self) -> Result<String, IsogeoClientError> {
        let url = self.url("about")?;
        let resp = check_api_response(self.http.get(url.clone()).send().await?).await?;
        let about = read_json(resp).await?;
        about
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| IsogeoClientError::InvalidResponse {
                url: url.to_string(),
                message: "no version in response".to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    async fn search_page(&self, params: &SearchParameters) -> Result<ResourceSearch, IsogeoClientError> {
        let mut query = params.to_query_pairs()?;
        if params.lang.is_none() {
            query.push(("_lang", self.config.lang.as_str().to_string()));
        }
        let resp = self
            .send(Method::GET, "resources/search", &query, None)
            .await?;
        serde_json::from_value(read_json(resp).await?).map_err(|e| {
            IsogeoClientError::InvalidResponse {
                url: "resources/search".to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Every record of a listing, following the pages of paged listings.
    async fn list_raw<T: ApiResource>(
        &self,
        parent: IsogeoUuid,
        include: String,
    ) -> Result<Vec<Value>, IsogeoClientError> {
        let route = T::listing_route(parent);
        let invalid = |route: &str| IsogeoClientError::InvalidResponse {
            url: route.to_string(),
            message: format!("expected a list of {} records", T::KIND),
        };

        if !T::PAGED_LISTING {
            let resp = self
                .send(Method::GET, &route, &self.read_params(include), None)
                .await?;
            return T::listing_items(read_json(resp).await?).ok_or_else(|| invalid(&route));
        }

        let stream = make_depaging_stream(
            |offset, page_size| {
                let mut params = self.read_params(include.clone());
                params.extend([
                    ("_limit", page_size.to_string()),
                    ("_offset", offset.to_string()),
                ]);
                let route = &route;
                async move {
                    let resp = self.send(Method::GET, route, &params, None).await?;
                    let body = read_json(resp).await?;
                    let total = body.get("total").and_then(Value::as_u64).unwrap_or(0);
                    let items = T::listing_items(body).ok_or_else(|| invalid(route))?;
                    Ok::<_, IsogeoClientError>((total, items))
                }
            },
            SEARCH_PAGE_SIZE,
        );
        let (total, items) = collect_search_results(stream, None).await?;
        debug!(total, fetched = items.len(), "read paged listing");
        Ok(items)
    }

    fn read_params(&self, include: String) -> Vec<(&'static str, String)> {
        let mut params = vec![("_lang", self.config.lang.as_str().to_string())];
        if !include.is_empty() {
            params.push(("_include", include));
        }
        params
    }

    fn url(&self, route: &str) -> Result<Url, IsogeoClientError> {
        self.api_url
            .join(route)
            .map_err(|e| IsogeoClientError::Other(format!("invalid route '{route}': {e}")))
    }

    /// Send an authenticated request, failing on error statuses.
    async fn send(
        &self,
        method: Method,
        route: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Response, IsogeoClientError> {
        let bearer = self.tokens.bearer().await?;
        let url = self.url(route)?;
        debug!(%method, %url, "sending request");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(bearer)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        check_api_response(request.send().await?).await
    }
}

/// `(uniqueness key, id)` of the records of a listing.
fn names_of<T: Model>(items: &[Value]) -> Vec<(String, IsogeoUuid)> {
    items
        .iter()
        .filter_map(|item| {
            let fields = item.as_object()?;
            let id = fields.get("_id")?.as_str()?.parse().ok()?;
            Some((uniqueness_key_of::<T>(fields)?, id))
        })
        .collect()
}

async fn read_json(resp: Response) -> Result<Value, IsogeoClientError> {
    let url = resp.url().to_string();
    resp.json::<Value>()
        .await
        .map_err(|e| IsogeoClientError::InvalidResponse {
            url,
            message: e.to_string(),
        })
}

/// Collects a stream of results, returning the total count.
async fn collect_search_results<T, E>(
    stream: impl Stream<Item = Result<StreamItem<T>, E>>,
    limit: Option<usize>,
) -> Result<(u64, Vec<T>), E> {
    let mut count = 0;
    let results = stream
        .try_filter_map(|item| {
            let new_item = match item {
                StreamItem::TotalCount(total) => {
                    count = total;
                    None
                },
                StreamItem::Result(res) => Some(res),
            };
            ready(Ok(new_item))
        })
        .take(limit.unwrap_or(usize::MAX))
        .try_collect::<Vec<_>>()
        .await?;
    Ok((count, results))
}

#[derive(Debug, Clone, PartialEq)]
enum StreamItem<T> {
    TotalCount(u64),
    Result(T),
}

/// Create a depaging stream from a page-fetching function.
///
/// `generator(offset, page_size)` returns `(total, items)`. Yields
/// `TotalCount` once followed by the items of every page. The API may serve
/// fewer items than asked for, so paging stops on an empty page or once the
/// total is reached.
fn make_depaging_stream<T, E, Fut>(
    generator: impl Fn(u64, u64) -> Fut,
    page_size: u64,
) -> impl Stream<Item = Result<StreamItem<T>, E>>
where
    Fut: Future<Output = Result<(u64, Vec<T>), E>>,
{
    try_stream! {
        let mut offset = 0;
        let mut total_count_yielded = false;

        loop {
            let (total_count, results) = generator(offset, page_size).await?;
            let items_on_page = results.len() as u64;

            if !total_count_yielded {
                yield StreamItem::TotalCount(total_count);
                total_count_yielded = true;
            }

            for result in results {
                yield StreamItem::Result(result)
            }

            offset += items_on_page;
            if items_on_page == 0 || offset >= total_count {
                break;
            }
        }
    }
}

/// Build the HTTP client shared by API and token requests.
fn build_http_client(config: &IsogeoClientConfig) -> Result<reqwest::Client, IsogeoClientError> {
    let mut headers = HeaderMap::new();

    // Extra headers (callers can tag their requests)
    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| IsogeoClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| IsogeoClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        platform = %config.platform,
        extra_headers = config.extra_headers.len(),
        "building Isogeo HTTP client"
    );

    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(std::time::Duration::from_secs(15))
        .timeout(config.timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| IsogeoClientError::Other(e.to_string()))
}
