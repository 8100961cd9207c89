//! Error types for board fetching, the proxy endpoint and dashboard params.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors raised while fetching board data.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A base URL could not be combined with the request path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Credentials are needed but none were configured.
    #[error("TRELLO_KEY or TRELLO_TOKEN not configured")]
    MissingCredentials,
}

impl FetchError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by `GET /api/board`.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("missing boardId")]
    MissingBoardId,

    #[error("TRELLO_KEY or TRELLO_TOKEN not configured")]
    NotConfigured,

    #[error("internal_error")]
    Upstream(#[from] FetchError),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::MissingBoardId => StatusCode::BAD_REQUEST,
            ProxyError::NotConfigured | ProxyError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::Upstream(e) => json!({ "error": self.to_string(), "details": e.to_string() }),
            _ => json!({ "error": self.to_string() }),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Errors raised while reading dashboard query parameters.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParamError {
    #[error("Invalid date for {name}: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_status_codes() {
        assert_eq!(ProxyError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ProxyError::MissingBoardId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::NotConfigured.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::from(FetchError::MissingCredentials).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ProxyError::MissingBoardId.to_string(), "missing boardId");
        let err = FetchError::Status {
            url: "https://api.trello.com/1/boards/x".into(),
            status: 404,
            body: "not found".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("HTTP 404"));
    }
}
