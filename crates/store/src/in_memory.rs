//! In-memory backend: useful for testing and ephemeral demos.

use async_trait::async_trait;
use edupilot_core::error::StoreError;
use edupilot_core::profile::ProfileStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps records in a map. Nothing survives the process.
pub struct InMemoryProfileStore {
    records: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a store from `(user_id, record)` pairs.
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        Self {
            records: Arc::new(RwLock::new(records.into_iter().collect())),
        }
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, record: serde_json::Value) -> Result<(), StoreError> {
        self.records.write().await.insert(user_id.to_string(), record);
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(user_id).is_some())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }
}
