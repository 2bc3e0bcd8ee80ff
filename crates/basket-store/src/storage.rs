//! # Cart Storage Backends
//!
//! The key-value contract the store persists through, plus its two
//! implementations.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CartStorage                                     │
//! │                                                                         │
//! │   read(key)  → Option<String>     absent key == empty cart             │
//! │   write(key, value)               replaces the whole slot              │
//! │                                                                         │
//! │   ┌──────────────────────┐        ┌──────────────────────────────┐     │
//! │   │   SqliteStorage      │        │   MemoryStorage              │     │
//! │   │   basket-db kv_store │        │   shared map, clonable,      │     │
//! │   │   (durable)          │        │   injectable write failures  │     │
//! │   └──────────────────────┘        └──────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use basket_db::Database;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{StorageError, StorageResult};

/// A string key-value slot store.
///
/// The store is its only writer, so implementations need no
/// read-modify-write protection of their own.
pub trait CartStorage: Send + Sync + 'static {
    /// Reads the value under `key`, `None` if it was never written.
    fn read(&self, key: &str) -> impl Future<Output = StorageResult<Option<String>>> + Send;

    /// Replaces the value under `key`.
    fn write(&self, key: &str, value: &str) -> impl Future<Output = StorageResult<()>> + Send;
}

// =============================================================================
// SQLite
// =============================================================================

/// Durable storage on the local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        SqliteStorage { db }
    }
}

impl CartStorage for SqliteStorage {
    async fn read(&self, key: &str) -> StorageResult<Option<String>> {
        self.db.kv().get(key).await.map_err(StorageError::from_read)
    }

    async fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.db.kv().set(key, value).await.map_err(StorageError::from_write)
    }
}

// =============================================================================
// In-Memory
// =============================================================================

/// Process-local storage. Clones share the same slots.
///
/// ## Example
/// ```rust
/// use basket_store::MemoryStorage;
///
/// let storage = MemoryStorage::new().with_value("basket:products", "[]");
/// storage.fail_next_writes(2);
///
/// assert_eq!(storage.get("basket:products").as_deref(), Some("[]"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    slots: Mutex<HashMap<String, String>>,
    failing_writes: AtomicU32,
    writes: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a slot, as if a previous session had written it.
    pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots().insert(key.into(), value.into());
        self
    }

    /// Makes the next `count` writes fail with a retryable error.
    pub fn fail_next_writes(&self, count: u32) {
        self.inner.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Returns the current value of a slot.
    pub fn get(&self, key: &str) -> Option<String> {
        self.slots().get(key).cloned()
    }

    /// Number of write attempts seen, failed ones included.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave a half-written slot
        self.inner
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self) -> bool {
        self.inner
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl CartStorage for MemoryStorage {
    async fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);

        if self.take_failure() {
            return Err(StorageError::Write("injected write failure".into()));
        }

        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basket_db::DbConfig;

    #[tokio::test]
    async fn test_memory_storage_shares_slots() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();

        storage.write("k", "v").await.unwrap();

        assert_eq!(clone.read("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(clone.read("missing").await.unwrap(), None);
        assert_eq!(clone.write_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let storage = MemoryStorage::new();
        storage.fail_next_writes(2);

        assert!(storage.write("k", "1").await.unwrap_err().is_retryable());
        assert!(storage.write("k", "2").await.is_err());
        storage.write("k", "3").await.unwrap();

        assert_eq!(storage.get("k").as_deref(), Some("3"));
        assert_eq!(storage.write_count(), 3);
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let storage = SqliteStorage::new(db);

        assert_eq!(storage.read("basket:products").await.unwrap(), None);

        storage.write("basket:products", "[]").await.unwrap();

        assert_eq!(
            storage.read("basket:products").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_sqlite_storage_closed_pool_is_unavailable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let storage = SqliteStorage::new(db.clone());
        db.close().await;

        let err = storage.write("k", "v").await.unwrap_err();

        assert!(matches!(err, StorageError::Unavailable(_)));
        assert!(!err.is_retryable());
    }
}
