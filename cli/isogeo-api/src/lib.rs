//! Client for the Isogeo metadata catalog API.
//!
//! This crate provides:
//! - input checks run before any request (identifiers, query filters,
//!   subresources, edition tabs)
//! - typed records with their wire mapping
//! - bearer token renewal ahead of expiration
//! - a per session cache of resource names, used to avoid duplicates
//!
//! ## Usage
//!
//! ```ignore
//! use isogeo_api::{Credentials, ExistenceCheck, IsogeoClient, IsogeoClientConfig, Platform};
//! use isogeo_api::models::Catalog;
//!
//! let config = IsogeoClientConfig::new(Platform::Prod, Credentials::ClientCredentials {
//!     client_id: "my-app".to_string(),
//!     client_secret: secret,
//! });
//! let client = IsogeoClient::new(config)?;
//! let outcome = client
//!     .create(workgroup_id, &Catalog::new("Roads"), ExistenceCheck::Check)
//!     .await?;
//! ```

pub mod auth;
pub mod cache;
pub mod checker;
mod client;
mod config;
mod error;
pub mod models;
pub mod query;
pub mod routes;

pub use auth::{AuthError, BearerToken, Credentials, TokenIssuer};
pub use checker::{CheckError, Includes, IsogeoUuid, MetadataType};
pub use client::{Created, ExistenceCheck, IsogeoClient, SEARCH_PAGE_SIZE};
pub use config::{IsogeoClientConfig, Lang, Platform};
pub use error::{IsogeoClientError, RemoteRejection};
pub use query::{normalize_query, FilterBuckets, FilterCategory, SearchParameters};
