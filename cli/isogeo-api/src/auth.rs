//! Bearer tokens and their renewal.
//!
//! Every authenticated request goes through [TokenManager::bearer], which
//! renews the token when it expires within the safety margin.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument};
use url::Url;

/// Tokens expiring within this margin are renewed before use.
pub const DEFAULT_TOKEN_MARGIN: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication expired and could not be renewed")]
    AuthenticationExpired(#[source] Box<AuthError>),
    #[error("credentials rejected by the identity service ({status})")]
    InvalidCredentials {
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("could not reach the identity service")]
    Transport(#[source] reqwest::Error),
    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),
}

/// An access token and its expiration.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("access_token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Fresh,
    Stale,
}

impl BearerToken {
    /// A token is fresh while it expires at least `margin` after `now`.
    pub fn state_at(&self, now: DateTime<Utc>, margin: Duration) -> TokenState {
        let margin = TimeDelta::from_std(margin).unwrap_or(TimeDelta::MAX);
        if self.expires_at - now >= margin {
            TokenState::Fresh
        } else {
            TokenState::Stale
        }
    }
}

/// OAuth2 credentials of an Isogeo application.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Group application, authenticated on its own behalf.
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    /// User application, authenticated on behalf of a user.
    Password {
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
    },
}

impl Credentials {
    pub fn client_id(&self) -> &str {
        match self {
            Credentials::ClientCredentials { client_id, .. }
            | Credentials::Password { client_id, .. } => client_id,
        }
    }

    fn client_secret(&self) -> &str {
        match self {
            Credentials::ClientCredentials { client_secret, .. }
            | Credentials::Password { client_secret, .. } => client_secret,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Credentials::Password {
                client_id,
                username,
                ..
            } => f
                .debug_struct("Password")
                .field("client_id", client_id)
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Source of time, replaceable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Something able to obtain a new bearer token.
pub trait TokenIssuer: Send + Sync {
    fn issue(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<BearerToken, AuthError>> + Send;
}

/// Token issuer backed by the Isogeo identity service.
#[derive(Debug, Clone)]
pub struct OAuthTokenIssuer {
    http: reqwest::Client,
    token_url: Url,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for dyn Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

impl OAuthTokenIssuer {
    pub fn new(http: reqwest::Client, token_url: Url) -> Self {
        Self {
            http,
            token_url,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl TokenIssuer for OAuthTokenIssuer {
    #[instrument(skip_all, fields(client_id = credentials.client_id()))]
    async fn issue(&self, credentials: &Credentials) -> Result<BearerToken, AuthError> {
        let form: Vec<(&str, &str)> = match credentials {
            Credentials::ClientCredentials { .. } => vec![("grant_type", "client_credentials")],
            Credentials::Password {
                username, password, ..
            } => vec![
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ],
        };

        let requested_at = self.clock.now();
        let resp = self
            .http
            .post(self.token_url.clone())
            .basic_auth(credentials.client_id(), Some(credentials.client_secret()))
            .form(&form)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp
                .json::<TokenErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error_description.or(body.error));
            error!(status = status.as_u16(), ?detail, "token request rejected");
            return Err(AuthError::InvalidCredentials { status, detail });
        }

        let token = resp
            .json::<TokenResponse>()
            .await
            .map_err(|err| AuthError::InvalidTokenResponse(err.to_string()))?;
        debug!(expires_in = token.expires_in, "token issued");

        let expires_at = TimeDelta::try_seconds(token.expires_in)
            .and_then(|lifetime| requested_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::InvalidTokenResponse(format!(
                    "token lifetime out of range: {}s",
                    token.expires_in
                ))
            })?;

        Ok(BearerToken {
            access_token: token.access_token,
            expires_at,
        })
    }
}

/// Holds the session token and renews it before it gets too old.
///
/// Renewal happens under the write lock: concurrent callers wait for it and
/// at most one renewal runs at a time.
#[derive(Debug)]
pub struct TokenManager<I> {
    issuer: I,
    credentials: Credentials,
    margin: Duration,
    clock: Arc<dyn Clock>,
    token: RwLock<Option<BearerToken>>,
}

impl<I: TokenIssuer> TokenManager<I> {
    pub fn new(issuer: I, credentials: Credentials) -> Self {
        Self {
            issuer,
            credentials,
            margin: DEFAULT_TOKEN_MARGIN,
            clock: Arc::new(SystemClock),
            token: RwLock::new(None),
        }
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start from an already issued token.
    pub fn with_token(self, token: BearerToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
            ..self
        }
    }

    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    pub async fn state(&self) -> TokenState {
        match &*self.token.read().await {
            Some(token) => token.state_at(self.clock.now(), self.margin),
            None => TokenState::Stale,
        }
    }

    /// A fresh access token, renewed first if needed.
    pub async fn bearer(&self) -> Result<String, AuthError> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref() {
                if token.state_at(self.clock.now(), self.margin) == TokenState::Fresh {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut guard = self.token.write().await;
        // renewed while waiting for the lock
        if let Some(token) = guard.as_ref() {
            if token.state_at(self.clock.now(), self.margin) == TokenState::Fresh {
                return Ok(token.access_token.clone());
            }
        }

        debug!("token missing or about to expire, renewing it");
        let token = self
            .issuer
            .issue(&self.credentials)
            .await
            .map_err(|err| {
                error!(%err, "could not renew token");
                AuthError::AuthenticationExpired(Box::new(err))
            })?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }
}
