//! ProfileStore trait: the document store holding role, profile and
//! performance records keyed by user identity.
//!
//! Records are loosely typed JSON objects. The context builder decides how
//! to read them; stores only persist and return them.

use crate::error::StoreError;
use async_trait::async_trait;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Backend name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Fetch the record for a user. `Ok(None)` when no record exists.
    async fn fetch(&self, user_id: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Insert or replace the record for a user.
    async fn put(&self, user_id: &str, record: serde_json::Value) -> Result<(), StoreError>;

    /// Remove a record. Returns whether anything was removed.
    async fn remove(&self, user_id: &str) -> Result<bool, StoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, StoreError>;
}
