//! # Key-Value Repository
//!
//! Local key-value slots, the storage contract the cart persists through.
//!
//! ## Slot Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         kv_store table                                  │
//! │                                                                         │
//! │  key               │ value                          │ updated_at       │
//! │  ──────────────────┼────────────────────────────────┼────────────────  │
//! │  basket:products   │ [{"id":"A",...,"quantity":2}]  │ 2026-10-18T...   │
//! │                                                                         │
//! │  • get on a missing key → None (a valid state, not an error)           │
//! │  • set always replaces the whole value (last write wins)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for key-value slot operations.
#[derive(Debug, Clone)]
pub struct KvRepository {
    pool: SqlitePool,
}

impl KvRepository {
    /// Creates a new KvRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KvRepository { pool }
    }

    /// Reads the value stored under `key`.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        debug!(key = %key, found = value.is_some(), "Read slot");
        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = value.len(), "Wrote slot");
        Ok(())
    }

    /// Returns when the slot was last written.
    pub async fn updated_at(&self, key: &str) -> DbResult<Option<DateTime<Utc>>> {
        let updated_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT updated_at FROM kv_store WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(updated_at)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let db = test_db().await;

        assert_eq!(db.kv().get("basket:products").await.unwrap(), None);
        assert_eq!(db.kv().updated_at("basket:products").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let db = test_db().await;

        db.kv().set("basket:products", "[]").await.unwrap();

        assert_eq!(
            db.kv().get("basket:products").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(db.kv().updated_at("basket:products").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let db = test_db().await;
        let kv = db.kv();

        kv.set("k", "first").await.unwrap();
        kv.set("k", "second").await.unwrap();

        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let db = test_db().await;
        let kv = db.kv();

        kv.set("shop:products", "a").await.unwrap();
        kv.set("other:products", "b").await.unwrap();

        assert_eq!(kv.get("shop:products").await.unwrap().as_deref(), Some("a"));
        assert_eq!(kv.get("other:products").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_overwrite_moves_updated_at_forward() {
        let db = test_db().await;
        let kv = db.kv();

        kv.set("k", "first").await.unwrap();
        let first = kv.updated_at("k").await.unwrap().unwrap();
        kv.set("k", "second").await.unwrap();
        let second = kv.updated_at("k").await.unwrap().unwrap();

        assert!(second >= first);
    }

    #[tokio::test]
    async fn test_value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basket.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.kv().set("k", "persisted").await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(
            reopened.kv().get("k").await.unwrap().as_deref(),
            Some("persisted")
        );
    }
}
