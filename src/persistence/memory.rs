use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::traits::{SnapshotStore, StorageError};
use crate::credentials::{upsert_credential, ConnectedBasketCredential};
use crate::product::ProductLineItem;

/// In-memory store, mainly for tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemoryStore {
    snapshots: DashMap<String, Vec<ProductLineItem>>,
    credentials: RwLock<Vec<ConnectedBasketCredential>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted snapshots
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn load_snapshot(&self, slug: &str) -> Result<Option<Vec<ProductLineItem>>, StorageError> {
        Ok(self.snapshots.get(slug).map(|r| r.value().clone()))
    }

    async fn save_snapshot(&self, slug: &str, items: &[ProductLineItem]) -> Result<(), StorageError> {
        self.snapshots.insert(slug.to_string(), items.to_vec());
        Ok(())
    }

    async fn delete_snapshot(&self, slug: &str) -> Result<(), StorageError> {
        self.snapshots.remove(slug);
        Ok(())
    }

    async fn load_credentials(&self) -> Result<Vec<ConnectedBasketCredential>, StorageError> {
        Ok(self.credentials.read().clone())
    }

    async fn save_credential(&self, credential: &ConnectedBasketCredential) -> Result<(), StorageError> {
        upsert_credential(&mut self.credentials.write(), credential.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> ProductLineItem {
        ProductLineItem::new(name)
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let store = InMemoryStore::new();
        assert!(store.load_snapshot("weekly").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemoryStore::new();
        store
            .save_snapshot("weekly", &[item("Milk"), item("Eggs")])
            .await
            .unwrap();

        let loaded = store.load_snapshot("weekly").await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "Milk");
    }

    #[tokio::test]
    async fn test_save_replaces_prior_snapshot() {
        let store = InMemoryStore::new();
        store.save_snapshot("weekly", &[item("Milk")]).await.unwrap();
        store.save_snapshot("weekly", &[item("Eggs")]).await.unwrap();

        let loaded = store.load_snapshot("weekly").await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Eggs");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_snapshot() {
        let store = InMemoryStore::new();
        store.save_snapshot("weekly", &[item("Milk")]).await.unwrap();
        store.delete_snapshot("weekly").await.unwrap();
        assert!(store.load_snapshot("weekly").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_credentials_upsert_by_slug() {
        let store = InMemoryStore::new();
        let mut cred = ConnectedBasketCredential {
            name: "Weekly".into(),
            slug: "weekly".into(),
            password: "old".into(),
        };
        store.save_credential(&cred).await.unwrap();

        cred.password = "new".into();
        store.save_credential(&cred).await.unwrap();

        let creds = store.load_credentials().await.unwrap();
        assert_eq!(creds.len(), 1);
        assert_eq!(creds[0].password, "new");
    }
}
