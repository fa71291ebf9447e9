//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml           # Watcher Configuration
//! ├── seen_content.json     # Every entry ever notified, in notification order
//! └── users.json            # Subscriber identities
//! ```
//!
//! Every write goes to a sibling `*.tmp` file which is flushed, synced and
//! then renamed over the target, so readers only ever observe the previous
//! or the next complete document.

use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Outcome of reading a state document that is allowed to be absent.
#[derive(Debug)]
pub enum Loaded<T> {
    /// Document parsed successfully
    Present(T),
    /// No document on disk yet
    Missing,
    /// Document exists but could not be parsed
    Corrupt(String),
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: impl AsRef<Path>) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    pub async fn write_bytes(&self, key: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    pub async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: impl AsRef<Path>,
        value: &T,
    ) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    pub async fn read_bytes(&self, key: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    pub async fn read_json<T: DeserializeOwned>(&self, key: impl AsRef<Path>) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read a JSON document, classifying failures instead of returning them.
    pub async fn load_json<T: DeserializeOwned>(&self, key: impl AsRef<Path>) -> Loaded<T> {
        match self.read_json(key).await {
            Ok(Some(value)) => Loaded::Present(value),
            Ok(None) => Loaded::Missing,
            Err(e) => Loaded::Corrupt(e.to_string()),
        }
    }

    /// Read a JSON document, falling back to `T::default()` when it is
    /// missing or unreadable.
    pub async fn load_json_or_default<T: DeserializeOwned + Default>(
        &self,
        key: impl AsRef<Path>,
    ) -> T {
        let key = key.as_ref();
        match self.load_json(key).await {
            Loaded::Present(value) => value,
            Loaded::Missing => {
                log::info!("No {} found, starting empty", key.display());
                T::default()
            }
            Loaded::Corrupt(reason) => {
                log::warn!(
                    "Stored state {} is unreadable ({}), starting empty",
                    key.display(),
                    reason
                );
                T::default()
            }
        }
    }
}
