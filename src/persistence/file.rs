//! JSON-file-backed snapshot store.
//!
//! One file per storage key under a root directory, written via a temp file
//! and rename so a crash mid-write never leaves a truncated snapshot behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::traits::{SnapshotStore, StorageError};
use crate::credentials::{upsert_credential, ConnectedBasketCredential};
use crate::product::ProductLineItem;

pub struct JsonFileStore {
    root: PathBuf,
    prefix: String,
}

impl JsonFileStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    fn snapshot_path(&self, slug: &str) -> PathBuf {
        self.root.join(format!("{}products_{}.json", self.prefix, slug))
    }

    fn credentials_path(&self) -> PathBuf {
        self.root.join(format!("{}connected_baskets.json", self.prefix))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        path: &Path,
    ) -> Result<Option<T>, StorageError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let bytes = serde_json::to_vec(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load_snapshot(&self, slug: &str) -> Result<Option<Vec<ProductLineItem>>, StorageError> {
        Self::read_json(&self.snapshot_path(slug)).await
    }

    async fn save_snapshot(&self, slug: &str, items: &[ProductLineItem]) -> Result<(), StorageError> {
        self.write_json(&self.snapshot_path(slug), &items).await
    }

    async fn delete_snapshot(&self, slug: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.snapshot_path(slug)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    async fn load_credentials(&self) -> Result<Vec<ConnectedBasketCredential>, StorageError> {
        Ok(Self::read_json(&self.credentials_path())
            .await?
            .unwrap_or_default())
    }

    async fn save_credential(&self, credential: &ConnectedBasketCredential) -> Result<(), StorageError> {
        let mut book = self.load_credentials().await?;
        upsert_credential(&mut book, credential.clone());
        self.write_json(&self.credentials_path(), &book).await
    }
}
