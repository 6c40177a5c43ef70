//! File-based profile store: JSON-lines storage.
//!
//! Each line is `{"user_id": "...", "record": {...}}`. The file is loaded
//! once on open and rewritten on every mutation, so reads never touch disk.
//!
//! Default location: `~/.edupilot/profiles.jsonl`

use async_trait::async_trait;
use edupilot_core::error::StoreError;
use edupilot_core::profile::ProfileStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct ProfileLine {
    user_id: String,
    record: serde_json::Value,
}

/// A file-backed profile store using JSONL (one record per line).
pub struct FileProfileStore {
    path: PathBuf,
    records: Arc<RwLock<BTreeMap<String, serde_json::Value>>>,
}

impl FileProfileStore {
    /// Open the store at `path`. A missing file starts empty and is created
    /// on first write; corrupted lines are skipped.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = Self::load_from_disk(&path).await?;
        debug!(path = %path.display(), count = records.len(), "File profile store loaded");
        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    async fn load_from_disk(path: &Path) -> Result<BTreeMap<String, serde_json::Value>, StoreError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<ProfileLine>(line) {
                Ok(entry) => Some((entry.user_id, entry.record)),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted profile line");
                    None
                }
            })
            .collect())
    }

    /// Rewrite the whole file from `records`. Callers swap the map in only
    /// after this succeeds.
    async fn flush(&self, records: &BTreeMap<String, serde_json::Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Storage(format!("Failed to create profile directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for (user_id, record) in records {
            let line = serde_json::to_string(&ProfileLine {
                user_id: user_id.clone(),
                record: record.clone(),
            })
            .map_err(|e| StoreError::Storage(format!("Failed to serialize profile: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to write profile file: {e}")))
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, record: serde_json::Value) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let mut next = records.clone();
        next.insert(user_id.to_string(), record);
        self.flush(&next).await?;
        *records = next;
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        if !records.contains_key(user_id) {
            return Ok(false);
        }
        let mut next = records.clone();
        next.remove(user_id);
        self.flush(&next).await?;
        *records = next;
        Ok(true)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }
}
