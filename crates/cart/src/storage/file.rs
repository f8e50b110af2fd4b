//! File-backed storage: one `<key>.json` file per session key.
//!
//! Keys are percent-encoded into file names. ASCII letters, digits, `_` and
//! `-` are kept; every other byte becomes `%XX`, so table numbers such as
//! `Patio 3` or tickets such as `#12` map to distinct, path-safe files.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::fs;
use tracing::{debug, instrument};

use super::{CartStorage, StorageError};

/// Bytes escaped in file names: everything except `[A-Za-z0-9_-]`.
const KEY_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// Cart storage rooted at a data directory.
///
/// The directory is created on first write. Writes go to a temporary file
/// that is renamed over the target, so a crash never leaves a half-written
/// cart behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the file holding `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is empty.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(format!("{}.json", file_stem(key)?)))
    }
}

/// Encoded file stem for `key`. Never empty and never starts with a dot.
fn file_stem(key: &str) -> Result<String, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_owned()));
    }
    Ok(utf8_percent_encode(key, KEY_ESCAPES).to_string())
}

#[async_trait]
impl CartStorage for FileStorage {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;

        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, blob), fields(root = %self.root.display(), bytes = blob.len()))]
    async fn set(&self, key: &str, blob: String) -> Result<(), StorageError> {
        let stem = file_stem(key)?;
        let path = self.root.join(format!("{stem}.json"));
        fs::create_dir_all(&self.root).await?;

        let tmp = self.root.join(format!(".{stem}.json.tmp"));
        fs::write(&tmp, blob).await?;
        fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), "Cart written");
        Ok(())
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
