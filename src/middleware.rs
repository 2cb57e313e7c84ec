//! Request middleware: token gate, access log, and panic recovery.

use crate::error::MockError;
use crate::server::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{error, info, warn};

/// Reject requests whose `Authorization` header differs from the configured token.
///
/// The header is compared verbatim; a missing header counts as empty.
pub async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let config = state.store.get().await;
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if provided != config.api_token.as_bytes() {
        let provided = String::from_utf8_lossy(provided);
        warn!(path = %request.uri().path(), "Rejected request with invalid token");

        let message = if state.echo_expected_token {
            format!(
                "expected authorization token to be {} got {}",
                config.api_token, provided
            )
        } else {
            format!("invalid authorization token {:?}", provided)
        };
        return MockError::Unauthorized(message).into_response();
    }

    next.run(request).await
}

/// Log method, path, status and latency of every request.
pub async fn access_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request served"
    );
    response
}

/// Turn a panicking handler into a 500 instead of a dropped connection.
pub async fn recover(request: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            error!(panic = %panic_message(panic.as_ref()), "Handler panicked");
            MockError::Internal("internal server error".to_string()).into_response()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Wrap a router with panic recovery and access logging.
pub fn with_safety_net(router: Router) -> Router {
    router
        .layer(middleware::from_fn(recover))
        .layer(middleware::from_fn(access_log))
}
