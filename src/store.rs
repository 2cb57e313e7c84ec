//! Shared configuration store.
//!
//! The store holds an `Arc` snapshot behind a lock. Readers clone the `Arc`
//! and keep a consistent view for as long as they hold it; writers swap in a
//! whole new record, so no reader ever sees a half-applied edit.

use crate::config::GameMockConfig;
use crate::error::MockError;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// The single process-wide configuration.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    current: Arc<RwLock<Arc<GameMockConfig>>>,
}

impl ConfigStore {
    pub fn new(initial: GameMockConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Current configuration snapshot.
    pub async fn get(&self) -> Arc<GameMockConfig> {
        self.current.read().await.clone()
    }

    /// Replace the whole configuration with `config`.
    pub async fn replace(&self, config: GameMockConfig) -> Arc<GameMockConfig> {
        let snapshot = Arc::new(config);
        *self.current.write().await = snapshot.clone();
        info!(
            open_server_status = snapshot.open_server_status,
            notify_status = snapshot.notify_status,
            zonelist_status = snapshot.zonelist_status,
            env = %snapshot.env,
            "Configuration replaced"
        );
        snapshot
    }

    /// Parse `body` as a full configuration and store it.
    ///
    /// A bare `null` body stores the zero record. On a parse failure the
    /// stored configuration is left untouched.
    pub async fn set(&self, body: &[u8]) -> Result<Arc<GameMockConfig>, MockError> {
        let config: Option<GameMockConfig> = serde_json::from_slice(body)?;
        Ok(self.replace(config.unwrap_or_default()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_initial() {
        let store = ConfigStore::new(GameMockConfig::startup("stg"));
        assert_eq!(*store.get().await, GameMockConfig::startup("stg"));
    }

    #[tokio::test]
    async fn test_set_replaces_whole_record() {
        let store = ConfigStore::new(GameMockConfig::startup("stg"));
        let stored = store.set(br#"{"notify_status": 202}"#).await.unwrap();

        assert_eq!(stored.notify_status, 202);
        // Not merged: fields absent from the edit reset to type defaults.
        assert_eq!(stored.open_server_status, 0);
        assert_eq!(stored.api_token, "");
        assert_eq!(*store.get().await, *stored);
    }

    #[tokio::test]
    async fn test_malformed_set_keeps_previous() {
        let store = ConfigStore::new(GameMockConfig::startup("stg"));
        let err = store.set(b"not json").await.unwrap_err();

        assert!(matches!(err, MockError::MalformedInput(_)));
        assert_eq!(*store.get().await, GameMockConfig::startup("stg"));
    }

    #[tokio::test]
    async fn test_null_body_stores_zero_record() {
        let store = ConfigStore::new(GameMockConfig::startup("stg"));
        let stored = store.set(b"null").await.unwrap();

        assert_eq!(*stored, GameMockConfig::default());
        assert_eq!(*store.get().await, GameMockConfig::default());
    }

    #[tokio::test]
    async fn test_snapshot_survives_replace() {
        let store = ConfigStore::new(GameMockConfig::startup("stg"));
        let snapshot = store.get().await;

        store.replace(GameMockConfig::default()).await;

        assert_eq!(snapshot.open_server_status, 200);
        assert_eq!(store.get().await.open_server_status, 0);
    }

    #[tokio::test]
    async fn test_concurrent_readers_never_see_mixed_record() {
        let store = ConfigStore::new(GameMockConfig::startup("stg"));

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..200u16 {
                    let mut config = GameMockConfig::startup("stg");
                    config.open_server_status = 200 + i;
                    config.notify_status = 200 + i;
                    store.replace(config).await;
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..200 {
                    let snapshot = store.get().await;
                    assert_eq!(snapshot.open_server_status, snapshot.notify_status);
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
