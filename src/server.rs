//! Router and simulated endpoints.
//!
//! Every endpoint answers from the configuration snapshot taken when the
//! request arrives: it stalls for the configured delay, replies with the
//! configured status, and for accepted open-server/notify requests hands a
//! callback to the dispatcher without waiting for it.

use crate::callback::{CallbackDispatcher, CallbackTargets, Operation};
use crate::config::{null_as_default, GameMockConfig};
use crate::error::MockError;
use crate::middleware::{require_token, with_safety_net};
use crate::store::ConfigStore;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: ConfigStore,
    pub dispatcher: CallbackDispatcher,
    /// Include the expected token in 401 messages, as the platform's own test double did.
    pub echo_expected_token: bool,
}

impl AppState {
    pub fn new(
        initial: GameMockConfig,
        app_id: impl Into<String>,
        targets: CallbackTargets,
    ) -> Result<Self, reqwest::Error> {
        let store = ConfigStore::new(initial);
        let dispatcher = CallbackDispatcher::new(store.clone(), app_id, targets)?;
        Ok(Self {
            store,
            dispatcher,
            echo_expected_token: false,
        })
    }

    pub fn with_echo_expected_token(mut self, echo: bool) -> Self {
        self.echo_expected_token = echo;
        self
    }
}

/// Body of `/api/server` and `/api/notify`.
///
/// Missing and `null` fields both read as the zero value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerActionRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub action_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub server_users: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub server_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub new_server_names: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub callback_token: String,
}

/// Body of every simulated success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulatedBody {
    pub message: String,
    pub status: u16,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/server", post(open_server))
        .route("/api/notify", post(notify))
        .route("/api/zonelist", get(zonelist))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    let app = Router::new()
        .route("/ping", get(ping))
        .route("/api/config", get(get_config).post(edit_config))
        .merge(protected)
        .with_state(state);

    with_safety_net(app)
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "pong" }))
}

async fn get_config(State(state): State<AppState>) -> Json<GameMockConfig> {
    Json(state.store.get().await.as_ref().clone())
}

async fn edit_config(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GameMockConfig>, MockError> {
    let stored = state.store.set(&body).await?;
    Ok(Json(stored.as_ref().clone()))
}

async fn open_server(State(state): State<AppState>, body: Bytes) -> Result<Response, MockError> {
    simulate_action(&state, Operation::OpenServer, &body).await
}

async fn notify(State(state): State<AppState>, body: Bytes) -> Result<Response, MockError> {
    simulate_action(&state, Operation::Notify, &body).await
}

async fn zonelist(State(state): State<AppState>) -> Result<Response, MockError> {
    let config = state.store.get().await;
    simulated_response(
        "zonelist_status",
        config.zonelist_status,
        config.zonelist_status_sleep,
    )
    .await
}

async fn simulate_action(
    state: &AppState,
    operation: Operation,
    body: &[u8],
) -> Result<Response, MockError> {
    let request: Option<ServerActionRequest> = serde_json::from_slice(body)?;
    let request = request.unwrap_or_default();
    let config = state.store.get().await;

    let (field, status, sleep) = match operation {
        Operation::OpenServer => (
            "open_server_status",
            config.open_server_status,
            config.open_server_status_sleep,
        ),
        Operation::Notify => (
            "notify_status",
            config.notify_status,
            config.notify_status_sleep,
        ),
    };

    debug!(
        operation = %operation,
        action_id = %request.action_id,
        server_id = request.server_id,
        server_users = request.server_users,
        new_servers = request.new_server_names.len(),
        "Simulating action"
    );

    let response = simulated_response(field, status, sleep).await?;

    if status == StatusCode::ACCEPTED.as_u16() {
        state
            .dispatcher
            .spawn(operation, request.callback_token, request.action_id);
    }

    Ok(response)
}

/// Stall for `sleep_secs`, then answer `status` with the standard body.
async fn simulated_response(
    field: &str,
    status: u16,
    sleep_secs: u64,
) -> Result<Response, MockError> {
    if sleep_secs > 0 {
        debug!(field, sleep_secs, "Applying delay");
        tokio::time::sleep(Duration::from_secs(sleep_secs)).await;
    }

    let code = StatusCode::from_u16(status)
        .ok()
        .filter(|code| !code.is_informational())
        .ok_or_else(|| {
            MockError::Internal(format!("configured {} {} is not a usable HTTP status", field, status))
        })?;

    let body = SimulatedBody {
        message: "ok".to_string(),
        status,
    };
    Ok((code, Json(body)).into_response())
}
