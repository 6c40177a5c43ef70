//! Store client with once-per-process initialization.
//!
//! The client is constructed explicitly (no global) and hands out a shared
//! handle to the configured backend. The first `handle()` call opens the
//! backend; every later or concurrent call receives that same handle. A
//! failed open leaves the client uninitialized so a later call can retry.

use crate::{FileProfileStore, InMemoryProfileStore};
use edupilot_config::StoreConfig;
use edupilot_core::error::StoreError;
use edupilot_core::profile::ProfileStore;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

pub struct StoreClient {
    config: StoreConfig,
    handle: OnceCell<Arc<dyn ProfileStore>>,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
        }
    }

    /// Wrap an already-open backend. `handle()` returns it unchanged.
    pub fn from_store(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            config: StoreConfig {
                backend: store.name().to_string(),
                path: None,
            },
            handle: OnceCell::new_with(Some(store)),
        }
    }

    /// Whether a backend is configured at all.
    pub fn is_enabled(&self) -> bool {
        self.config.backend != "none"
    }

    /// Whether the backend has been opened.
    pub fn is_initialized(&self) -> bool {
        self.handle.initialized()
    }

    /// Return the shared backend handle, opening it on first use.
    pub async fn handle(&self) -> Result<Arc<dyn ProfileStore>, StoreError> {
        self.handle
            .get_or_try_init(|| open_backend(&self.config))
            .await
            .cloned()
    }
}

async fn open_backend(config: &StoreConfig) -> Result<Arc<dyn ProfileStore>, StoreError> {
    let store: Arc<dyn ProfileStore> = match config.backend.as_str() {
        "memory" => Arc::new(InMemoryProfileStore::new()),
        "file" => Arc::new(FileProfileStore::open(config.resolved_path()).await?),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = config.resolved_path();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::Storage(format!("Failed to create profile directory: {e}"))
                })?;
            }
            let url = format!("sqlite://{}", path.display());
            Arc::new(crate::SqliteProfileStore::new(&url).await?)
        }
        other => {
            return Err(StoreError::NotConfigured(format!(
                "profile store backend '{other}' is not available"
            )));
        }
    };

    info!(backend = store.name(), "Profile store opened");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn handle_is_created_once() {
        let client = StoreClient::new(StoreConfig {
            backend: "memory".into(),
            path: None,
        });
        assert!(!client.is_initialized());

        let first = client.handle().await.unwrap();
        first.put("u1", json!({"name": "Asha"})).await.unwrap();

        let second = client.handle().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.fetch("u1").await.unwrap().is_some());
        assert!(client.is_initialized());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_handle() {
        let client = Arc::new(StoreClient::new(StoreConfig {
            backend: "memory".into(),
            path: None,
        }));

        let a = tokio::spawn({
            let client = client.clone();
            async move { client.handle().await.unwrap() }
        });
        let b = tokio::spawn({
            let client = client.clone();
            async move { client.handle().await.unwrap() }
        });

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn disabled_backend_reports_not_configured() {
        let client = StoreClient::new(StoreConfig {
            backend: "none".into(),
            path: None,
        });
        assert!(!client.is_enabled());
        let err = client.handle().await.err().unwrap();
        assert!(matches!(err, StoreError::NotConfigured(_)));
        assert!(!client.is_initialized());
    }

    #[tokio::test]
    async fn file_backend_opens_at_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.jsonl");
        let client = StoreClient::new(StoreConfig {
            backend: "file".into(),
            path: Some(path.display().to_string()),
        });

        let store = client.handle().await.unwrap();
        store.put("u1", json!({"name": "Asha"})).await.unwrap();
        assert_eq!(store.name(), "file");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn wrapped_store_is_returned_as_is() {
        let inner: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
        let client = StoreClient::from_store(inner.clone());
        assert!(client.is_initialized());
        assert!(Arc::ptr_eq(&client.handle().await.unwrap(), &inner));
    }
}
