//! Persistence adapter for serialized carts.
//!
//! A [`CartStorage`] is a scoped key-value store: one serialized cart blob per
//! session key. The store treats every failure as non-fatal - a failed read
//! becomes an empty cart, a failed write or remove is logged and skipped.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - process-local map, used by tests and previews
//! - [`FileStorage`] - one JSON file per key under a data directory

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur in a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key cannot be mapped onto the backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Backend is unreachable or refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence for serialized carts.
///
/// Implementations must tolerate concurrent use across different keys.
#[async_trait]
pub trait CartStorage: Send + Sync + std::fmt::Debug {
    /// Read the blob stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the blob stored under `key`.
    async fn set(&self, key: &str, blob: String) -> Result<(), StorageError>;

    /// Remove the blob stored under `key`.
    ///
    /// Returns `Ok(())` even if nothing was stored.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
