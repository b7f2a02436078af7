//! Configuration types for Isogeo client construction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::{Credentials, DEFAULT_TOKEN_MARGIN};
use crate::checker::CheckError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_USER_AGENT: &str = concat!("isogeo-api/", env!("CARGO_PKG_VERSION"));

/// Isogeo platform to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Prod,
    Qa,
}

impl Platform {
    pub fn api_url(self) -> &'static str {
        match self {
            Platform::Prod => "https://v1.api.isogeo.com",
            Platform::Qa => "https://v1.api.qa.isogeo.com",
        }
    }

    pub fn id_url(self) -> &'static str {
        match self {
            Platform::Prod => "https://id.api.isogeo.com/oauth/token",
            Platform::Qa => "https://id.api.qa.isogeo.com/oauth/token",
        }
    }

    /// Web application, where metadata are edited.
    pub fn app_url(self) -> &'static str {
        match self {
            Platform::Prod => "https://app.isogeo.com",
            Platform::Qa => "https://qa-isogeo-app.azurewebsites.net",
        }
    }
}

impl FromStr for Platform {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prod" => Ok(Platform::Prod),
            "qa" => Ok(Platform::Qa),
            _ => Err(CheckError::invalid_value("platform", s, &["prod", "qa"])),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Prod => write!(f, "prod"),
            Platform::Qa => write!(f, "qa"),
        }
    }
}

/// Language of the labels returned by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Fr,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Fr => "fr",
        }
    }
}

/// Configuration for Isogeo client construction.
#[derive(Debug, Clone)]
pub struct IsogeoClientConfig {
    pub platform: Platform,
    /// Overrides the API URL of the platform.
    pub api_url: Option<Url>,
    /// Overrides the token URL of the platform.
    pub id_url: Option<Url>,
    pub credentials: Credentials,
    pub lang: Lang,
    pub user_agent: Option<String>,
    /// Timeout of a whole request.
    pub timeout: Duration,
    /// Tokens expiring within this margin are renewed before use.
    pub token_margin: Duration,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
}

impl IsogeoClientConfig {
    pub fn new(platform: Platform, credentials: Credentials) -> Self {
        Self {
            platform,
            api_url: None,
            id_url: None,
            credentials,
            lang: Lang::default(),
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
            token_margin: DEFAULT_TOKEN_MARGIN,
            extra_headers: BTreeMap::new(),
        }
    }

    pub fn api_url(&self) -> Result<Url, url::ParseError> {
        match &self.api_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.platform.api_url()),
        }
    }

    pub fn id_url(&self) -> Result<Url, url::ParseError> {
        match &self.id_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.platform.id_url()),
        }
    }

    pub fn app_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.platform.app_url())
    }
}
