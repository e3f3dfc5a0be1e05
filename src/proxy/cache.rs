//! Versioned cache stores for the interception proxy.
//!
//! Each deploy version gets its own named store; activation deletes every
//! store whose name is not the current version. There is no per-entry TTL —
//! bumping the version string is the only invalidation mechanism.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Cache backend error: {0}")]
    Backend(String),
    #[error("Install failed: {0}")]
    Install(String),
}

/// A response held in (or destined for) a version's cache store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    /// Cross-origin response whose contents the client cannot inspect
    pub opaque: bool,
    /// Served from the application's own origin
    pub same_origin: bool,
}

impl CachedResponse {
    /// Plain successful same-origin response, the only kind worth caching.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: None,
            opaque: false,
            same_origin: true,
        }
    }

    /// Only direct same-origin 200s go into the cache; opaque, error and
    /// redirect responses are returned to the caller without caching.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.same_origin && !self.opaque
    }
}

/// One version's cache store: URL → response.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, url: &str) -> Result<Option<CachedResponse>, ProxyError>;
    async fn put(&self, url: &str, response: CachedResponse) -> Result<(), ProxyError>;
}

/// The collection of version-named cache stores.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open (creating if absent) the store for a version tag.
    async fn open(&self, version: &str) -> Result<Arc<dyn CacheStore>, ProxyError>;

    /// Names of every existing store.
    async fn list(&self) -> Result<Vec<String>, ProxyError>;

    /// Delete a version's store entirely. Returns whether it existed.
    async fn delete(&self, version: &str) -> Result<bool, ProxyError>;
}

/// In-memory cache storage.
#[derive(Default)]
pub struct InMemoryCacheStorage {
    stores: DashMap<String, Arc<InMemoryCacheStore>>,
}

impl InMemoryCacheStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<String, CachedResponse>,
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, url: &str) -> Result<Option<CachedResponse>, ProxyError> {
        Ok(self.entries.get(url).map(|r| r.value().clone()))
    }

    async fn put(&self, url: &str, response: CachedResponse) -> Result<(), ProxyError> {
        self.entries.insert(url.to_string(), response);
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn open(&self, version: &str) -> Result<Arc<dyn CacheStore>, ProxyError> {
        let store = self
            .stores
            .entry(version.to_string())
            .or_insert_with(|| Arc::new(InMemoryCacheStore::default()))
            .clone();
        Ok(store)
    }

    async fn list(&self) -> Result<Vec<String>, ProxyError> {
        Ok(self.stores.iter().map(|r| r.key().clone()).collect())
    }

    async fn delete(&self, version: &str) -> Result<bool, ProxyError> {
        Ok(self.stores.remove(version).is_some())
    }
}
