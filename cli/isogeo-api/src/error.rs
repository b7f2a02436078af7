//! Error handling for Isogeo API operations.

use std::fmt;

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::checker::CheckError;
use crate::models::ModelError;

/// A request the API answered with a status of 400 or above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRejection {
    pub status: StatusCode,
    pub reason: String,
    /// Message extracted from the response body, if any.
    pub detail: Option<String>,
    pub url: String,
}

impl fmt::Display for RemoteRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.status.as_u16(), self.reason, self.url)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// Common error type for Isogeo API operations.
#[derive(Debug, Error)]
pub enum IsogeoClientError {
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("request rejected by the API: {0}")]
    RemoteRejected(RemoteRejection),
    #[error("could not reach the API")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
    #[error("{}", .0)]
    Other(String),
}

impl IsogeoClientError {
    /// Status of a rejected request.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            IsogeoClientError::RemoteRejected(rejection) => Some(rejection.status),
            IsogeoClientError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for IsogeoClientError {
    fn from(err: reqwest::Error) -> Self {
        IsogeoClientError::Transport(err)
    }
}

/// Body shape of API errors. Both keys show up depending on the route.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

/// Pass successful responses through, turn failed ones into
/// [IsogeoClientError::RemoteRejected].
pub(crate) async fn check_api_response(resp: Response) -> Result<Response, IsogeoClientError> {
    let status = resp.status();
    if status.as_u16() < 400 {
        return Ok(resp);
    }

    let url = resp.url().to_string();
    let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
    // The body is only read for its message; HTML error pages are ignored.
    let detail = resp
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error.or(body.detail));

    error!(
        status = status.as_u16(),
        %reason,
        detail = detail.as_deref().unwrap_or(""),
        %url,
        "request rejected by the API"
    );

    Err(IsogeoClientError::RemoteRejected(RemoteRejection {
        status,
        reason,
        detail,
        url,
    }))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rejection_display_includes_detail() {
        let rejection = RemoteRejection {
            status: StatusCode::NOT_FOUND,
            reason: "Not Found".to_string(),
            detail: Some("not found".to_string()),
            url: "https://v1.api.isogeo.com/groups/x/catalogs".to_string(),
        };
        assert_eq!(
            rejection.to_string(),
            "404 Not Found (https://v1.api.isogeo.com/groups/x/catalogs): not found"
        );
        let err = IsogeoClientError::RemoteRejected(rejection);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn check_errors_are_transparent() {
        let err: IsogeoClientError = CheckError::InvalidIdentifier("abc".to_string()).into();
        assert_eq!(err.to_string(), "'abc' is not a valid Isogeo UUID");
        assert_eq!(err.status(), None);
    }
}
