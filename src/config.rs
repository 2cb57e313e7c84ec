//! Runtime configuration for the mock game platform.
//!
//! A single [`GameMockConfig`] record drives every simulated endpoint: the
//! status each one answers with, how long it stalls first, and what the
//! asynchronous callback reports.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Token accepted on protected routes until an operator replaces it.
pub const DEFAULT_API_TOKEN: &str = "valid_gamedemo_api_token";

/// Delay applied to every simulated endpoint at startup, in seconds.
pub const DEFAULT_SLEEP_SECS: u64 = 15;

/// Environment name that routes callbacks to the production platform.
pub const PROD_ENV: &str = "prod";

/// The whole mutable configuration of the mock.
///
/// Deserialization is lenient: unknown fields are ignored and missing or
/// `null` ones fall back to the zero value of their type, so a partial edit
/// yields a fully-formed record rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameMockConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub open_server_status: u16,
    /// Seconds to stall before answering `/api/server`
    #[serde(deserialize_with = "null_as_default")]
    pub open_server_status_sleep: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub open_server_callback_success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub open_server_callback_message: String,

    #[serde(deserialize_with = "null_as_default")]
    pub notify_status: u16,
    /// Seconds to stall before answering `/api/notify`
    #[serde(deserialize_with = "null_as_default")]
    pub notify_status_sleep: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub notify_callback_success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub notify_callback_message: String,

    #[serde(deserialize_with = "null_as_default")]
    pub zonelist_status: u16,
    /// Seconds to stall before answering `/api/zonelist`
    #[serde(deserialize_with = "null_as_default")]
    pub zonelist_status_sleep: u64,

    /// Compared verbatim against the `Authorization` header
    #[serde(deserialize_with = "null_as_default")]
    pub api_token: String,

    /// Callback environment; [`PROD_ENV`] selects production URLs
    #[serde(deserialize_with = "null_as_default")]
    pub env: String,
}

/// Read a field that may be `null`, treating `null` like an absent key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl GameMockConfig {
    /// The configuration a freshly started process serves.
    pub fn startup(env: impl Into<String>) -> Self {
        Self {
            open_server_status: 200,
            open_server_status_sleep: DEFAULT_SLEEP_SECS,
            open_server_callback_success: true,
            open_server_callback_message: "whoops".to_string(),
            notify_status: 200,
            notify_status_sleep: DEFAULT_SLEEP_SECS,
            notify_callback_success: true,
            notify_callback_message: "oops".to_string(),
            zonelist_status: 200,
            zonelist_status_sleep: DEFAULT_SLEEP_SECS,
            api_token: DEFAULT_API_TOKEN.to_string(),
            env: env.into(),
        }
    }

    /// Load a YAML seed file layered on top of `base`.
    ///
    /// Keys present in the file win; everything else keeps the value from
    /// `base`, so a seed file only needs to name what it changes.
    pub fn from_file(path: &Path, base: &GameMockConfig) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_overlay(&content, base)?;
        config.validate()?;
        Ok(config)
    }

    fn from_yaml_overlay(content: &str, base: &GameMockConfig) -> anyhow::Result<Self> {
        let overlay: serde_yaml::Value = serde_yaml::from_str(content)?;
        let mut merged = serde_yaml::to_value(base)?;

        match (merged.as_mapping_mut(), overlay) {
            (Some(target), serde_yaml::Value::Mapping(source)) => {
                for (key, value) in source {
                    target.insert(key, value);
                }
            }
            (_, serde_yaml::Value::Null) => {}
            _ => anyhow::bail!("Configuration file must contain a mapping"),
        }

        Ok(serde_yaml::from_value(merged)?)
    }

    /// Validate the configuration.
    ///
    /// Only applied to seed files; runtime edits are shape-checked only.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (field, status) in [
            ("open_server_status", self.open_server_status),
            ("notify_status", self.notify_status),
            ("zonelist_status", self.zonelist_status),
        ] {
            if !(100..=599).contains(&status) {
                anyhow::bail!("Invalid {}: {}", field, status);
            }
        }
        Ok(())
    }

    /// Whether callbacks should target the production platform.
    pub fn is_prod(&self) -> bool {
        self.env == PROD_ENV
    }
}
