//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CartStorage, StorageError};

/// Process-local cart storage.
///
/// Cloning shares the underlying map, so a test can keep a handle to inspect
/// what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns `true` if a blob is stored under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.blobs.read().await.contains_key(key)
    }
}

#[async_trait]
impl CartStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, blob: String) -> Result<(), StorageError> {
        self.blobs.write().await.insert(key.to_owned(), blob);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("cart_table_1").await.unwrap(), None);

        storage.set("cart_table_1", "{}".to_string()).await.unwrap();
        assert_eq!(
            storage.get("cart_table_1").await.unwrap().as_deref(),
            Some("{}")
        );

        storage.remove("cart_table_1").await.unwrap();
        assert!(!storage.contains("cart_table_1").await);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let storage = MemoryStorage::new();
        assert!(storage.remove("cart_guest").await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.set("cart_ticket_9", "{}".to_string()).await.unwrap();
        assert_eq!(handle.keys().await, vec!["cart_ticket_9".to_string()]);
    }
}
