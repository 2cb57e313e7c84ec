//! Asynchronous callback delivery.
//!
//! After an accepted open-server or notify request the real platform later
//! calls the game back with the outcome. The dispatcher imitates that with a
//! single, detached, best-effort POST.

use crate::config::GameMockConfig;
use crate::error::CallbackError;
use crate::store::ConfigStore;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Identifier this service reports in every callback.
pub const DEFAULT_APP_ID: &str = "gamedemo";

const PROD_NEW_SERVER_URL: &str = "https://game-cloud.g123.jp/cp/api/v1/new_server/callback";
const STG_OPEN_SERVER_URL: &str = "https://game-cloud.stg.g123.jp/cp/api/v1/open_server/callback";
const STG_NEW_SERVER_URL: &str = "https://game-cloud.stg.g123.jp/cp/api/v1/new_server/callback";

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Which simulated operation triggered a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    OpenServer,
    Notify,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::OpenServer => f.write_str("open_server"),
            Operation::Notify => f.write_str("notify"),
        }
    }
}

/// Production and staging URL for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFamily {
    pub prod: String,
    pub staging: String,
}

/// Callback URLs for every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTargets {
    pub open_server: UrlFamily,
    pub notify: UrlFamily,
}

impl Default for CallbackTargets {
    fn default() -> Self {
        Self {
            open_server: UrlFamily {
                prod: PROD_NEW_SERVER_URL.to_string(),
                staging: STG_OPEN_SERVER_URL.to_string(),
            },
            notify: UrlFamily {
                prod: PROD_NEW_SERVER_URL.to_string(),
                staging: STG_NEW_SERVER_URL.to_string(),
            },
        }
    }
}

impl CallbackTargets {
    /// Send every callback to `url`, regardless of operation or environment.
    pub fn fixed(url: impl Into<String>) -> Self {
        let url = url.into();
        let family = UrlFamily {
            prod: url.clone(),
            staging: url,
        };
        Self {
            open_server: family.clone(),
            notify: family,
        }
    }

    /// URL for `operation` under the environment named in `config`.
    pub fn resolve(&self, operation: Operation, config: &GameMockConfig) -> &str {
        let family = match operation {
            Operation::OpenServer => &self.open_server,
            Operation::Notify => &self.notify,
        };
        if config.is_prod() {
            &family.prod
        } else {
            &family.staging
        }
    }
}

/// Body of the callback POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub app_id: String,
    pub callback_token: String,
    pub action_id: String,
    pub success: bool,
    pub message: String,
}

/// Delivery counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    dispatched: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DispatchStats {
    /// Callbacks started.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Callbacks that reached the remote end (any response status).
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Callbacks lost to serialization or transport errors.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

struct Inner {
    client: reqwest::Client,
    app_id: String,
    targets: CallbackTargets,
    store: ConfigStore,
    stats: DispatchStats,
}

/// Fire-and-forget callback sender.
#[derive(Clone)]
pub struct CallbackDispatcher {
    inner: Arc<Inner>,
}

impl CallbackDispatcher {
    pub fn new(
        store: ConfigStore,
        app_id: impl Into<String>,
        targets: CallbackTargets,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                app_id: app_id.into(),
                targets,
                store,
                stats: DispatchStats::default(),
            }),
        })
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.inner.stats
    }

    /// Start a detached delivery for `operation`.
    ///
    /// The outcome and callback message are read from the configuration in
    /// effect when the task runs. Failures are logged and counted; nothing is
    /// reported back to the caller. The handle is only useful to tests.
    pub fn spawn(
        &self,
        operation: Operation,
        callback_token: String,
        action_id: String,
    ) -> JoinHandle<()> {
        self.inner.stats.dispatched.fetch_add(1, Ordering::Relaxed);
        let dispatcher = self.clone();

        tokio::spawn(async move {
            let config = dispatcher.inner.store.get().await;
            let payload = dispatcher.payload(operation, &config, callback_token, action_id);
            let url = dispatcher.inner.targets.resolve(operation, &config);

            match dispatcher.deliver(url, &payload).await {
                Ok(status) => {
                    dispatcher.inner.stats.delivered.fetch_add(1, Ordering::Relaxed);
                    info!(
                        operation = %operation,
                        url = %url,
                        status = %status,
                        action_id = %payload.action_id,
                        "Callback delivered"
                    );
                }
                Err(err) => {
                    dispatcher.inner.stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        operation = %operation,
                        action_id = %payload.action_id,
                        error = %err,
                        "Callback delivery failed"
                    );
                }
            }
        })
    }

    fn payload(
        &self,
        operation: Operation,
        config: &GameMockConfig,
        callback_token: String,
        action_id: String,
    ) -> CallbackPayload {
        let (success, message) = match operation {
            Operation::OpenServer => (
                config.open_server_callback_success,
                config.open_server_callback_message.clone(),
            ),
            Operation::Notify => (
                config.notify_callback_success,
                config.notify_callback_message.clone(),
            ),
        };
        CallbackPayload {
            app_id: self.inner.app_id.clone(),
            callback_token,
            action_id,
            success,
            message,
        }
    }

    async fn deliver(
        &self,
        url: &str,
        payload: &CallbackPayload,
    ) -> Result<reqwest::StatusCode, CallbackError> {
        let body = serde_json::to_vec(payload)?;
        debug!(url = %url, bytes = body.len(), "Sending callback");

        let response = self
            .inner
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| CallbackError::Send {
                url: url.to_string(),
                source,
            })?;

        Ok(response.status())
    }
}
