//! Game Platform Mock Server
//!
//! An HTTP stand-in for a game platform's callback-driven server API, used to
//! exercise a game backend's integration without the real platform. Status
//! codes, latency, and the asynchronous callback outcome of each endpoint are
//! adjustable at runtime.
//!
//! # Features
//!
//! - **Runtime Configuration**: `GET`/`POST /api/config` read and replace the whole configuration
//! - **Latency Simulation**: Each endpoint stalls for its configured number of seconds
//! - **Status Simulation**: Each endpoint answers with its configured HTTP status
//! - **Callbacks**: Accepted (202) open-server and notify requests trigger a detached POST
//!   to the platform callback URL
//! - **Token Gate**: Simulated endpoints require the configured `Authorization` token
//!
//! # Example Configuration
//!
//! ```json
//! {
//!   "open_server_status": 202,
//!   "open_server_status_sleep": 0,
//!   "open_server_callback_success": true,
//!   "open_server_callback_message": "whoops",
//!   "notify_status": 200,
//!   "notify_status_sleep": 15,
//!   "notify_callback_success": true,
//!   "notify_callback_message": "oops",
//!   "zonelist_status": 200,
//!   "zonelist_status_sleep": 15,
//!   "api_token": "valid_gamedemo_api_token",
//!   "env": "stg"
//! }
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod middleware;
pub mod server;
pub mod store;

pub use callback::{CallbackDispatcher, CallbackTargets};
pub use config::GameMockConfig;
pub use server::{router, AppState};
pub use store::ConfigStore;
