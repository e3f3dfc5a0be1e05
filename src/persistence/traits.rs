use async_trait::async_trait;
use thiserror::Error;

use crate::credentials::ConnectedBasketCredential;
use crate::product::ProductLineItem;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Snapshot not found")]
    NotFound,
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable key-value storage for basket snapshots and the credential book.
///
/// Snapshots live under `<prefix>products_<slug>`; the credential book under
/// its own `<prefix>connected_baskets` key. The store is a best-effort
/// durability aid: the engine logs failures and keeps going on in-memory
/// state alone.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted snapshot for a basket, `None` if never saved.
    async fn load_snapshot(&self, slug: &str) -> Result<Option<Vec<ProductLineItem>>, StorageError>;

    /// Persist the full snapshot for a basket, replacing any prior one.
    async fn save_snapshot(&self, slug: &str, items: &[ProductLineItem]) -> Result<(), StorageError>;

    /// Permanently drop a basket's persisted snapshot.
    async fn delete_snapshot(&self, slug: &str) -> Result<(), StorageError>;

    /// Load every credential the client has ever connected with.
    async fn load_credentials(&self) -> Result<Vec<ConnectedBasketCredential>, StorageError>;

    /// Upsert a credential by slug (password overwritten in place).
    async fn save_credential(&self, credential: &ConnectedBasketCredential) -> Result<(), StorageError>;
}
