//! Network-interception cache proxy.
//!
//! Keeps the application shell and its assets available offline,
//! independently of basket data traffic. A proxy instance walks
//! `Installing → Activating → Active` once per application load and
//! persists until a deploy bumps the version tag, at which point the next
//! activation garbage-collects every prior version's store.
//!
//! Interception strategies:
//! - non-web schemes pass through untouched;
//! - navigations are network-first with shell and offline-page fallbacks;
//! - assets are cache-first with background population.

pub mod cache;
pub mod fetch;

pub use cache::{CacheStorage, CacheStore, CachedResponse, InMemoryCacheStorage, ProxyError};
pub use fetch::{FetchError, Fetcher, HttpFetcher, Request, RequestClass};

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Lifecycle of a proxy instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// Opening and populating the current version's store
    Installing,
    /// Garbage-collecting prior versions
    Activating,
    /// Intercepting requests
    Active,
}

impl std::fmt::Display for ProxyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Installing => write!(f, "Installing"),
            Self::Activating => write!(f, "Activating"),
            Self::Active => write!(f, "Active"),
        }
    }
}

const SHELL_URL: &str = "/";
const OFFLINE_URL: &str = "/offline.html";

pub struct RequestInterceptionProxy {
    version: String,
    manifest: Vec<String>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state_tx: watch::Sender<ProxyState>,
    state_rx: watch::Receiver<ProxyState>,
    current: RwLock<Option<Arc<dyn CacheStore>>>,
}

impl RequestInterceptionProxy {
    pub fn new(
        version: impl Into<String>,
        manifest: Vec<String>,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ProxyState::Installing);
        Self {
            version: version.into(),
            manifest,
            storage,
            fetcher,
            state_tx,
            state_rx,
            current: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> ProxyState {
        *self.state_rx.borrow()
    }

    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ProxyState> {
        self.state_rx.clone()
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Install: open the current version's store and precache the manifest.
    ///
    /// Completes without coordinating with prior instances — the new
    /// version takes over immediately rather than waiting for open pages to
    /// release the old one. A failed precache fails the whole install and
    /// leaves any prior version serving.
    #[tracing::instrument(skip(self), fields(version = %self.version))]
    pub async fn install(&self) -> Result<(), ProxyError> {
        let _ = self.state_tx.send(ProxyState::Installing);
        let store = self.storage.open(&self.version).await?;

        for url in &self.manifest {
            let request = Request::asset(url.clone());
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| ProxyError::Install(format!("precache {url}: {e}")))?;
            if response.status != 200 {
                return Err(ProxyError::Install(format!(
                    "precache {url}: status {}",
                    response.status
                )));
            }
            store.put(url, response).await?;
        }

        *self.current.write() = Some(store);
        info!(resources = self.manifest.len(), "Proxy installed");
        crate::metrics::record_operation("proxy", "install", "success");
        Ok(())
    }

    /// Activate: delete every store whose name is not the current version,
    /// then take control of interception immediately.
    ///
    /// This garbage collection is the only eviction mechanism; entries
    /// within a version are never individually invalidated.
    #[tracing::instrument(skip(self), fields(version = %self.version))]
    pub async fn activate(&self) -> Result<(), ProxyError> {
        let _ = self.state_tx.send(ProxyState::Activating);

        for name in self.storage.list().await? {
            if name != self.version {
                debug!(stale = %name, "Deleting prior cache version");
                self.storage.delete(&name).await?;
            }
        }

        let _ = self.state_tx.send(ProxyState::Active);
        info!("Proxy active");
        crate::metrics::record_operation("proxy", "activate", "success");
        Ok(())
    }

    /// Install and activate in one go.
    pub async fn start(&self) -> Result<(), ProxyError> {
        self.install().await?;
        self.activate().await
    }

    /// Intercept one request.
    ///
    /// Never fails for a navigation (a synthesized 503 is the floor);
    /// asset and passthrough transport errors propagate to the caller.
    #[tracing::instrument(skip(self), fields(url = %request.url))]
    pub async fn handle(&self, request: &Request) -> Result<CachedResponse, FetchError> {
        if !request.is_web_scheme() {
            // Never cached, never matched
            crate::metrics::record_cache("passthrough", "fetch");
            return self.fetcher.fetch(request).await;
        }

        match request.class {
            RequestClass::Navigation => Ok(self.network_first(request).await),
            RequestClass::Asset => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &Request) -> CachedResponse {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                crate::metrics::record_cache("network_first", "network");
                response
            }
            Err(e) => {
                debug!(error = %e, "Navigation fetch failed, falling back to cache");
                if let Some(shell) = self.cache_match(SHELL_URL).await {
                    crate::metrics::record_cache("network_first", "shell");
                    return shell;
                }
                if let Some(offline) = self.cache_match(OFFLINE_URL).await {
                    crate::metrics::record_cache("network_first", "offline_page");
                    return offline;
                }
                crate::metrics::record_cache("network_first", "unavailable");
                CachedResponse {
                    status: 503,
                    body: b"offline".to_vec(),
                    content_type: Some("text/plain".to_string()),
                    opaque: false,
                    same_origin: true,
                }
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> Result<CachedResponse, FetchError> {
        if let Some(cached) = self.cache_match(&request.url).await {
            crate::metrics::record_cache("cache_first", "hit");
            return Ok(cached);
        }

        let response = self.fetcher.fetch(request).await?;
        crate::metrics::record_cache("cache_first", "miss");

        if response.is_cacheable() {
            if let Some(store) = self.current.read().clone() {
                // Fire-and-forget relative to the response already handed
                // back: a failed write must never fail or delay it.
                let url = request.url.clone();
                let clone = response.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.put(&url, clone).await {
                        warn!(%url, error = %e, "Background cache write failed");
                        crate::metrics::record_cache("cache_first", "write_error");
                    }
                });
            }
        }

        Ok(response)
    }

    async fn cache_match(&self, url: &str) -> Option<CachedResponse> {
        let store = self.current.read().clone()?;
        match store.get(url).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(%url, error = %e, "Cache lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Fetcher with a scripted URL map and an online/offline switch.
    struct ScriptedFetcher {
        online: AtomicBool,
        responses: HashMap<String, CachedResponse>,
        fetches: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<(&str, CachedResponse)>) -> Self {
            Self {
                online: AtomicBool::new(true),
                responses: responses
                    .into_iter()
                    .map(|(u, r)| (u.to_string(), r))
                    .collect(),
                fetches: AtomicUsize::new(0),
            }
        }

        fn go_offline(&self) {
            self.online.store(false, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, request: &Request) -> Result<CachedResponse, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.online.load(Ordering::SeqCst) {
                return Err(FetchError::Offline("scripted outage".into()));
            }
            Ok(self
                .responses
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| CachedResponse {
                    status: 404,
                    body: vec![],
                    content_type: None,
                    opaque: false,
                    same_origin: true,
                }))
        }
    }

    fn shell_manifest_fetcher() -> Arc<ScriptedFetcher> {
        Arc::new(ScriptedFetcher::new(vec![
            ("/", CachedResponse::ok("<shell>")),
            ("/offline.html", CachedResponse::ok("<offline>")),
        ]))
    }

    fn proxy_with(
        version: &str,
        manifest: Vec<&str>,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<ScriptedFetcher>,
    ) -> RequestInterceptionProxy {
        RequestInterceptionProxy::new(
            version,
            manifest.into_iter().map(ToString::to_string).collect(),
            storage,
            fetcher,
        )
    }

    #[tokio::test]
    async fn test_lifecycle_states() {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let proxy = proxy_with("v1", vec!["/"], storage, shell_manifest_fetcher());

        assert_eq!(proxy.state(), ProxyState::Installing);
        proxy.install().await.unwrap();
        proxy.activate().await.unwrap();
        assert_eq!(proxy.state(), ProxyState::Active);
    }

    #[tokio::test]
    async fn test_activation_purges_prior_versions() {
        let storage = Arc::new(InMemoryCacheStorage::new());

        let v1 = proxy_with("v1", vec!["/"], storage.clone(), shell_manifest_fetcher());
        v1.start().await.unwrap();

        let v2 = proxy_with("v2", vec!["/"], storage.clone(), shell_manifest_fetcher());
        v2.start().await.unwrap();

        let remaining = storage.list().await.unwrap();
        assert_eq!(remaining, vec!["v2"], "no prior version store remains");
    }

    #[tokio::test]
    async fn test_install_fails_when_precache_fails() {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let fetcher = shell_manifest_fetcher();
        fetcher.go_offline();

        let proxy = proxy_with("v1", vec!["/"], storage, fetcher);
        assert!(matches!(proxy.install().await, Err(ProxyError::Install(_))));
    }

    #[tokio::test]
    async fn test_navigation_offline_serves_cached_shell() {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let fetcher = shell_manifest_fetcher();
        let proxy = proxy_with("v1", vec!["/", "/offline.html"], storage, fetcher.clone());
        proxy.start().await.unwrap();

        fetcher.go_offline();
        let response = proxy.handle(&Request::navigation("/baskets/weekly")).await.unwrap();
        assert_eq!(response.body, b"<shell>");
    }

    #[tokio::test]
    async fn test_navigation_offline_without_shell_serves_offline_page() {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let fetcher = shell_manifest_fetcher();
        // Shell deliberately left out of the manifest
        let proxy = proxy_with("v1", vec!["/offline.html"], storage, fetcher.clone());
        proxy.start().await.unwrap();

        fetcher.go_offline();
        let response = proxy.handle(&Request::navigation("/baskets/weekly")).await.unwrap();
        assert_eq!(response.body, b"<offline>");
    }

    #[tokio::test]
    async fn test_navigation_offline_with_empty_cache_synthesizes_503() {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let proxy = proxy_with("v1", vec![], storage, fetcher.clone());
        proxy.start().await.unwrap();

        fetcher.go_offline();
        let response = proxy.handle(&Request::navigation("/")).await.unwrap();
        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn test_asset_cache_first_populates_in_background() {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            "/app.js",
            CachedResponse::ok("console.log('hi')"),
        )]));
        let proxy = proxy_with("v1", vec![], storage, fetcher.clone());
        proxy.start().await.unwrap();

        let first = proxy.handle(&Request::asset("/app.js")).await.unwrap();
        assert_eq!(first.status, 200);
        // Background write lands shortly after the response was returned
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        fetcher.go_offline();
        let second = proxy.handle(&Request::asset("/app.js")).await.unwrap();
        assert_eq!(second.body, first.body);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1, "second hit never left cache");
    }

    #[tokio::test]
    async fn test_non_200_asset_not_cached() {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let proxy = proxy_with("v1", vec![], storage, fetcher.clone());
        proxy.start().await.unwrap();

        let miss = proxy.handle(&Request::asset("/gone.js")).await.unwrap();
        assert_eq!(miss.status, 404);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        // Still goes to network every time
        proxy.handle(&Request::asset("/gone.js")).await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_opaque_response_not_cached() {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let mut opaque = CachedResponse::ok("secret");
        opaque.opaque = true;
        let fetcher = Arc::new(ScriptedFetcher::new(vec![("/tracker.js", opaque)]));
        let proxy = proxy_with("v1", vec![], storage, fetcher.clone());
        proxy.start().await.unwrap();

        proxy.handle(&Request::asset("/tracker.js")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        proxy.handle(&Request::asset("/tracker.js")).await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_web_scheme_passes_through_uncached() {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            "chrome-extension://abc/inject.js",
            CachedResponse::ok("x"),
        )]));
        let proxy = proxy_with("v1", vec![], storage, fetcher.clone());
        proxy.start().await.unwrap();

        let req = Request::asset("chrome-extension://abc/inject.js");
        proxy.handle(&req).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        proxy.handle(&req).await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2, "never served from cache");
    }

    #[tokio::test]
    async fn test_cache_write_failure_never_affects_response() {
        struct FailingStore;

        #[async_trait]
        impl CacheStore for FailingStore {
            async fn get(&self, _url: &str) -> Result<Option<CachedResponse>, ProxyError> {
                Ok(None)
            }
            async fn put(&self, _url: &str, _r: CachedResponse) -> Result<(), ProxyError> {
                Err(ProxyError::Backend("disk full".into()))
            }
        }

        struct FailingStorage;

        #[async_trait]
        impl CacheStorage for FailingStorage {
            async fn open(&self, _version: &str) -> Result<Arc<dyn CacheStore>, ProxyError> {
                Ok(Arc::new(FailingStore))
            }
            async fn list(&self) -> Result<Vec<String>, ProxyError> {
                Ok(vec![])
            }
            async fn delete(&self, _version: &str) -> Result<bool, ProxyError> {
                Ok(false)
            }
        }

        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            "/app.js",
            CachedResponse::ok("js"),
        )]));
        let proxy = proxy_with("v1", vec![], Arc::new(FailingStorage), fetcher);
        proxy.start().await.unwrap();

        let response = proxy.handle(&Request::asset("/app.js")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"js");
    }
}
