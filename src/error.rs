//! Error types for request handling and callback delivery.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors surfaced to the HTTP caller.
#[derive(Debug, Error)]
pub enum MockError {
    /// Request body does not match the expected shape.
    #[error("{0}")]
    MalformedInput(String),

    /// Missing or wrong token on a protected route.
    #[error("{0}")]
    Unauthorized(String),

    /// Anything the caller could not have caused, e.g. an unusable configured status.
    #[error("{0}")]
    Internal(String),
}

impl From<serde_json::Error> for MockError {
    fn from(err: serde_json::Error) -> Self {
        MockError::MalformedInput(err.to_string())
    }
}

/// JSON body for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl MockError {
    pub fn status(&self) -> StatusCode {
        match self {
            MockError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            MockError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MockError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Errors raised while delivering a callback.
///
/// These never leave the dispatch task; they are logged and counted.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("failed to serialize callback payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to send callback to {url}: {source}")]
    Send {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
