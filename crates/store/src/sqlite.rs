//! SQLite profile store.
//!
//! One table, `profiles`, holding the JSON-encoded record per user along with
//! its last update time. Writes are upserts.

use async_trait::async_trait;
use chrono::Utc;
use edupilot_core::error::StoreError;
use edupilot_core::profile::ProfileStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

pub struct SqliteProfileStore {
    pool: SqlitePool,
}

impl SqliteProfileStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database; it is pinned to a
    /// single connection so every query sees the same data.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite profile store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id     TEXT PRIMARY KEY NOT NULL,
                record      TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("profiles table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let row = sqlx::query("SELECT record FROM profiles WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("SELECT failed: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row
            .try_get("record")
            .map_err(|e| StoreError::QueryFailed(format!("record column: {e}")))?;

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::QueryFailed(format!("Stored record is not JSON: {e}")))
    }

    async fn put(&self, user_id: &str, record: serde_json::Value) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&record)
            .map_err(|e| StoreError::Storage(format!("Record serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, record, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                record = excluded.record,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(&raw)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;

        debug!(user_id, "Stored profile");
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM profiles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("COUNT failed: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_store() -> SqliteProfileStore {
        SqliteProfileStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn store_and_fetch() {
        let db = test_store().await;
        db.put(
            "s-001",
            json!({"role": "Student", "name": "Asha", "subjects": [{"name": "Math", "score": 88}]}),
        )
        .await
        .unwrap();

        let record = db.fetch("s-001").await.unwrap().unwrap();
        assert_eq!(record["subjects"][0]["score"], 88);
        assert!(db.fetch("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_on_conflict() {
        let db = test_store().await;
        db.put("s-001", json!({"name": "Version 1"})).await.unwrap();
        db.put("s-001", json!({"name": "Version 2"})).await.unwrap();

        assert_eq!(db.count().await.unwrap(), 1);
        assert_eq!(db.fetch("s-001").await.unwrap().unwrap()["name"], "Version 2");
    }

    #[tokio::test]
    async fn remove_record() {
        let db = test_store().await;
        db.put("s-001", json!({})).await.unwrap();
        assert!(db.remove("s-001").await.unwrap());
        assert!(!db.remove("s-001").await.unwrap());
        assert_eq!(db.count().await.unwrap(), 0);
    }
}
