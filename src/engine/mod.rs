//! Sync engine coordinator.
//!
//! The [`SyncEngine`] owns the authoritative local view of a basket's items.
//! Mutations apply optimistically: the next snapshot replaces in-memory state
//! and is persisted before the remote authority is consulted, then the
//! canonical response either reconciles the local view or the pre-mutation
//! snapshot is restored.
//!
//! # Generation discipline
//!
//! A monotonic generation counter is incremented at the start of every
//! mutation. Any asynchronous continuation — a mutation's response, a
//! background poll — captured its generation by value and is a guaranteed
//! no-op if the counter moved on before it resumed. This replaces locking:
//! overlapping edits stay responsive and only the most recent user intent
//! survives a race with network latency.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use basketi_sync::{
//!     ActiveCredential, BasketConfig, HttpRemoteAuthority, InMemoryStore,
//!     SyncEngine, TracingSink,
//! };
//!
//! # async fn example() {
//! let config = BasketConfig {
//!     api_base_url: "https://basketi.example".into(),
//!     ..Default::default()
//! };
//! let active = ActiveCredential::new();
//! let remote = Arc::new(HttpRemoteAuthority::new(&config.api_base_url, active.clone()));
//! let engine = SyncEngine::new(
//!     config,
//!     Arc::new(InMemoryStore::new()),
//!     remote,
//!     Arc::new(TracingSink),
//!     active,
//! );
//!
//! engine.connect_basket("weekly", "hunter2").await;
//! engine.add_product("Milk").await.unwrap();
//! # }
//! ```

mod basket_api;
mod poller;
mod types;

pub use poller::BackgroundPoller;
pub use types::{EngineError, SyncStatus};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::BasketConfig;
use crate::credentials::ActiveCredential;
use crate::notify::{Notification, NotificationSink};
use crate::persistence::SnapshotStore;
use crate::product::{clamp_quantity, normalize_name, ProductLineItem, ProductPayload};
use crate::remote::RemoteAuthority;
use crate::remote::RemoteError;

pub(crate) struct Inner {
    config: BasketConfig,
    store: Arc<dyn SnapshotStore>,
    remote: Arc<dyn RemoteAuthority>,
    notifier: Arc<dyn NotificationSink>,
    active: ActiveCredential,

    /// The authoritative local snapshot
    snapshot: RwLock<Vec<ProductLineItem>>,

    /// Monotonic generation counter, bumped at the start of every mutation
    generation: AtomicU64,

    /// Status broadcast + the epoch guarding transient-status reverts
    status_tx: watch::Sender<SyncStatus>,
    status_rx: watch::Receiver<SyncStatus>,
    status_epoch: AtomicU64,

    /// Snapshot broadcast: subscribers are notified after every committed change
    snapshot_tx: watch::Sender<Vec<ProductLineItem>>,
    snapshot_rx: watch::Receiver<Vec<ProductLineItem>>,

    /// Transient new-product input buffer, cleared when a mutation commits
    new_product_input: RwLock<String>,
}

/// Client-side synchronization engine for one selected basket.
///
/// Cheap to clone; all clones share the same state. Designed for concurrent
/// use: overlapping mutations are reconciled by the generation discipline,
/// not by serialization.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<Inner>,
}

impl SyncEngine {
    pub fn new(
        config: BasketConfig,
        store: Arc<dyn SnapshotStore>,
        remote: Arc<dyn RemoteAuthority>,
        notifier: Arc<dyn NotificationSink>,
        active: ActiveCredential,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(SyncStatus::Idle);
        let (snapshot_tx, snapshot_rx) = watch::channel(Vec::new());

        Self {
            inner: Arc::new(Inner {
                config,
                store,
                remote,
                notifier,
                active,
                snapshot: RwLock::new(Vec::new()),
                generation: AtomicU64::new(0),
                status_tx,
                status_rx,
                status_epoch: AtomicU64::new(0),
                snapshot_tx,
                snapshot_rx,
                new_product_input: RwLock::new(String::new()),
            }),
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn config(&self) -> &BasketConfig {
        &self.inner.config
    }

    /// Current sync status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        *self.inner.status_rx.borrow()
    }

    /// Watch status changes.
    #[must_use]
    pub fn status_receiver(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status_rx.clone()
    }

    /// Current snapshot (full ordered item list).
    #[must_use]
    pub fn snapshot(&self) -> Vec<ProductLineItem> {
        self.inner.snapshot.read().clone()
    }

    /// Subscribe to committed snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<ProductLineItem>> {
        self.inner.snapshot_rx.clone()
    }

    /// Current generation counter value.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Slug of the currently selected basket, if any.
    #[must_use]
    pub fn current_basket(&self) -> Option<String> {
        self.inner.active.slug()
    }

    #[must_use]
    pub fn new_product_input(&self) -> String {
        self.inner.new_product_input.read().clone()
    }

    pub fn set_new_product_input(&self, input: impl Into<String>) {
        *self.inner.new_product_input.write() = input.into();
    }

    /// Load the persisted snapshot for the selected basket into memory.
    ///
    /// Used on startup before the first refresh so a previously seen list
    /// shows instantly, even offline.
    pub async fn load_from_store(&self) -> Result<(), EngineError> {
        let slug = self.require_slug()?;
        self.load_persisted_snapshot(&slug).await;
        Ok(())
    }

    // --- Public mutations ---

    /// Add a product by name.
    ///
    /// If an item with the same normalized name is already on the list this
    /// is a no-op (rapid duplicate submissions stay idempotent). If it
    /// matches a known-but-removed item, that item is reactivated instead of
    /// duplicated. Otherwise a new pending item is appended.
    #[tracing::instrument(skip(self))]
    pub async fn add_product(&self, name: &str) -> Result<(), EngineError> {
        let slug = self.require_slug()?;
        let trimmed = name.trim();
        let normalized = normalize_name(trimmed);
        if normalized.is_empty() {
            return Ok(());
        }

        let next = {
            let snapshot = self.inner.snapshot.read();
            match snapshot.iter().position(|i| i.normalized_name == normalized) {
                Some(idx) if snapshot[idx].is_added => {
                    debug!(name = %trimmed, "Already on the list, ignoring duplicate add");
                    crate::metrics::record_operation("engine", "add", "duplicate");
                    None
                }
                Some(idx) => {
                    let mut next = snapshot.clone();
                    next[idx].reactivate();
                    Some(next)
                }
                None => {
                    let mut next = snapshot.clone();
                    next.push(ProductLineItem::new(trimmed));
                    Some(next)
                }
            }
        };

        if let Some(next) = next {
            self.mutate(slug, next).await;
        }
        Ok(())
    }

    /// Toggle an item's presence on the active list.
    ///
    /// Turning an item on resets its quantity to 1. `key` is the item's
    /// authority id, or its local placeholder while pending.
    #[tracing::instrument(skip(self))]
    pub async fn set_product_added(&self, key: &str, is_added: bool) -> Result<(), EngineError> {
        let slug = self.require_slug()?;

        let next = {
            let snapshot = self.inner.snapshot.read();
            let mut next = snapshot.clone();
            match next.iter_mut().find(|i| i.key() == key) {
                Some(item) => {
                    item.is_added = is_added;
                    if is_added {
                        item.quantity = 1;
                    }
                    Some(next)
                }
                None => {
                    debug!(%key, "set_product_added on unknown key, ignoring");
                    None
                }
            }
        };

        if let Some(next) = next {
            self.mutate(slug, next).await;
        }
        Ok(())
    }

    /// Set an item's quantity, clamped to a minimum of 1.
    #[tracing::instrument(skip(self))]
    pub async fn set_product_quantity(&self, key: &str, quantity: u32) -> Result<(), EngineError> {
        let slug = self.require_slug()?;

        let next = {
            let snapshot = self.inner.snapshot.read();
            let mut next = snapshot.clone();
            match next.iter_mut().find(|i| i.key() == key) {
                Some(item) => {
                    item.quantity = clamp_quantity(quantity);
                    Some(next)
                }
                None => {
                    debug!(%key, "set_product_quantity on unknown key, ignoring");
                    None
                }
            }
        };

        if let Some(next) = next {
            self.mutate(slug, next).await;
        }
        Ok(())
    }

    /// Clear every item from the active list (history is preserved).
    #[tracing::instrument(skip(self))]
    pub async fn remove_all_from_active_list(&self) -> Result<(), EngineError> {
        let slug = self.require_slug()?;

        let next = {
            let snapshot = self.inner.snapshot.read();
            let mut next = snapshot.clone();
            for item in &mut next {
                item.is_added = false;
            }
            next
        };

        self.mutate(slug, next).await;
        Ok(())
    }

    /// Permanently delete an item, history included.
    ///
    /// Bypasses the generation machinery for immediacy but keeps the same
    /// rollback contract: remove locally and persist first, then call the
    /// authority, and restore the prior list if it rejects.
    #[tracing::instrument(skip(self))]
    pub async fn remove_product_permanently(&self, key: &str) -> Result<(), EngineError> {
        let slug = self.require_slug()?;

        let (previous, remote_id) = {
            let snapshot = self.inner.snapshot.read();
            let Some(item) = snapshot.iter().find(|i| i.key() == key) else {
                debug!(%key, "remove_product_permanently on unknown key, ignoring");
                return Ok(());
            };
            (snapshot.clone(), item.id.clone())
        };

        {
            let mut snapshot = self.inner.snapshot.write();
            snapshot.retain(|i| i.key() != key);
        }
        self.publish_snapshot();
        self.persist(&slug).await;

        // A pending item was never persisted remotely; local removal is all.
        let Some(remote_id) = remote_id else {
            crate::metrics::record_operation("engine", "delete", "local_only");
            return Ok(());
        };

        match self.inner.remote.delete_item(&slug, &remote_id).await {
            Ok(resp) => {
                let canonical: Vec<ProductLineItem> =
                    resp.products.into_iter().map(Into::into).collect();
                *self.inner.snapshot.write() = canonical;
                self.publish_snapshot();
                self.persist(&slug).await;
                self.set_status_transient(SyncStatus::Success);
                crate::metrics::record_operation("engine", "delete", "success");
            }
            Err(e) => {
                warn!(error = %e, "Permanent delete rejected, restoring snapshot");
                *self.inner.snapshot.write() = previous;
                self.publish_snapshot();
                self.persist(&slug).await;
                self.set_status_transient(SyncStatus::Error);
                self.notify_remote_failure(&e).await;
                crate::metrics::record_operation("engine", "delete", "error");
            }
        }
        Ok(())
    }

    /// Re-fetch the canonical list from the remote authority.
    ///
    /// A background refresh never overwrites local state once a newer
    /// mutation has started: the response only applies while the generation
    /// captured before the fetch is still current. Refresh failures are
    /// logged, never surfaced.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self, is_background: bool) -> Result<(), EngineError> {
        let slug = self.require_slug()?;
        let start = Instant::now();
        let issued_under = self.inner.generation.load(Ordering::SeqCst);

        match self.inner.remote.fetch_items(&slug).await {
            Ok(resp) => {
                let canonical: Vec<ProductLineItem> =
                    resp.products.into_iter().map(Into::into).collect();
                // Checked under the lock: a mutation that started after
                // this poll was issued must not have its optimistic
                // snapshot overwritten by the poll's older canonical list.
                {
                    let mut snapshot = self.inner.snapshot.write();
                    if is_background
                        && self.inner.generation.load(Ordering::SeqCst) != issued_under
                    {
                        debug!(issued_under, "Background refresh superseded, discarding");
                        crate::metrics::record_stale_generation("refresh");
                        return Ok(());
                    }
                    *snapshot = canonical;
                }
                self.publish_snapshot();
                self.persist(&slug).await;
                crate::metrics::record_operation("engine", "refresh", "success");
                crate::metrics::record_latency("engine", "refresh", start.elapsed());
            }
            Err(e) => {
                warn!(error = %e, is_background, "Refresh failed");
                crate::metrics::record_operation("engine", "refresh", "error");
            }
        }
        Ok(())
    }

    // --- The core mutation algorithm ---

    /// Apply a next snapshot optimistically and reconcile it with the
    /// remote authority.
    ///
    /// 1. Bump the generation, capturing the new value `g`.
    /// 2. Swap the snapshot in, persist it, clear the input buffer.
    /// 3. Status → `Syncing`.
    /// 4. Send the normalized payload to the authority.
    /// 5. Success: if the generation still equals `g`, the canonical
    ///    response replaces local state (ids and categories get assigned);
    ///    otherwise the response is discarded.
    /// 6. Failure: if the generation still equals `g`, the pre-mutation
    ///    snapshot is restored and the user notified; otherwise discarded —
    ///    the newer mutation's own outcome governs the visible state.
    async fn mutate(&self, slug: String, next: Vec<ProductLineItem>) {
        let start = Instant::now();
        let g = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let previous = {
            let mut snapshot = self.inner.snapshot.write();
            std::mem::replace(&mut *snapshot, next.clone())
        };
        self.publish_snapshot();
        self.inner.new_product_input.write().clear();
        self.persist(&slug).await;

        self.set_status(SyncStatus::Syncing);

        let payload: Vec<ProductPayload> = next.iter().map(ProductPayload::from).collect();
        match self.inner.remote.update_items(&slug, &payload).await {
            Ok(resp) => {
                let canonical: Vec<ProductLineItem> =
                    resp.products.into_iter().map(Into::into).collect();
                // The staleness check must happen under the snapshot lock:
                // a newer mutation bumps the counter before it swaps its
                // snapshot in, so checking and applying as one critical
                // section guarantees a stale response never lands on top
                // of newer intent.
                {
                    let mut snapshot = self.inner.snapshot.write();
                    if self.inner.generation.load(Ordering::SeqCst) != g {
                        debug!(generation = g, "Mutation response superseded, discarding");
                        crate::metrics::record_stale_generation("mutate");
                        return;
                    }
                    *snapshot = canonical;
                }
                self.publish_snapshot();
                self.persist(&slug).await;
                self.set_status_transient(SyncStatus::Success);
                self.spawn_classification(slug);
                crate::metrics::record_operation("engine", "mutate", "success");
                crate::metrics::record_latency("engine", "mutate", start.elapsed());
            }
            Err(e) => {
                {
                    let mut snapshot = self.inner.snapshot.write();
                    if self.inner.generation.load(Ordering::SeqCst) != g {
                        debug!(generation = g, error = %e, "Failed mutation superseded, discarding");
                        crate::metrics::record_stale_generation("mutate");
                        return;
                    }
                    warn!(generation = g, error = %e, "Mutation rejected, rolling back");
                    *snapshot = previous;
                }
                self.publish_snapshot();
                self.persist(&slug).await;
                self.set_status_transient(SyncStatus::Error);
                self.notify_remote_failure(&e).await;
                crate::metrics::record_operation("engine", "mutate", "error");
            }
        }
    }

    // --- Internal helpers ---

    fn require_slug(&self) -> Result<String, EngineError> {
        self.inner.active.slug().ok_or(EngineError::NoBasketSelected)
    }

    /// Notify subscribers of the committed snapshot.
    fn publish_snapshot(&self) {
        let snapshot = self.inner.snapshot.read().clone();
        crate::metrics::set_snapshot_items(snapshot.len());
        let _ = self.inner.snapshot_tx.send(snapshot);
    }

    /// Best-effort persistence: the store is a durability aid, not a
    /// correctness requirement; failures are logged and the engine keeps
    /// going on in-memory state.
    async fn persist(&self, slug: &str) {
        let items = self.inner.snapshot.read().clone();
        if let Err(e) = self.inner.store.save_snapshot(slug, &items).await {
            warn!(error = %e, %slug, "Snapshot persistence failed, continuing in-memory");
            crate::metrics::record_operation("persistence", "save", "error");
        }
    }

    fn set_status(&self, status: SyncStatus) {
        self.inner.status_epoch.fetch_add(1, Ordering::SeqCst);
        let _ = self.inner.status_tx.send(status);
    }

    /// Set a display status that reverts to Idle after the configured
    /// window, unless a newer status change happens first.
    fn set_status_transient(&self, status: SyncStatus) {
        let epoch = self.inner.status_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.inner.status_tx.send(status);

        let engine = self.clone();
        let window = Duration::from_millis(self.inner.config.status_display_ms);
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if engine.inner.status_epoch.load(Ordering::SeqCst) == epoch {
                let _ = engine.inner.status_tx.send(SyncStatus::Idle);
            }
        });
    }

    pub(crate) async fn notify_remote_failure(&self, error: &RemoteError) {
        let message = match error {
            RemoteError::Rejected { message } => message.clone(),
            _ => "Could not reach the basket server".to_string(),
        };
        self.inner.notifier.notify(Notification::Error(message)).await;
    }

    /// Fill in missing categories via the external classifier.
    ///
    /// Fire-and-forget: the result is merged only if the item still exists
    /// and still has no category; failures are logged only.
    fn spawn_classification(&self, slug: String) {
        let pending: Vec<String> = self
            .inner
            .snapshot
            .read()
            .iter()
            .filter(|i| i.category.is_none())
            .filter_map(|i| i.id.clone())
            .collect();
        if pending.is_empty() {
            return;
        }

        let engine = self.clone();
        tokio::spawn(async move {
            for id in pending {
                match engine.inner.remote.classify_product(&id).await {
                    Ok(resp) => {
                        let Some(kind) = resp.kind else { continue };
                        let merged = {
                            let mut snapshot = engine.inner.snapshot.write();
                            match snapshot
                                .iter_mut()
                                .find(|i| i.id.as_deref() == Some(id.as_str()) && i.category.is_none())
                            {
                                Some(item) => {
                                    item.category = Some(kind);
                                    true
                                }
                                None => false,
                            }
                        };
                        if merged {
                            engine.publish_snapshot();
                            engine.persist(&slug).await;
                        }
                    }
                    Err(e) => {
                        debug!(%id, error = %e, "Classification failed");
                        crate::metrics::record_operation("engine", "classify", "error");
                    }
                }
            }
        });
    }

    // --- Selection plumbing shared by the basket flows ---

    pub(crate) async fn load_persisted_snapshot(&self, slug: &str) {
        match self.inner.store.load_snapshot(slug).await {
            Ok(Some(items)) => {
                *self.inner.snapshot.write() = items;
                self.publish_snapshot();
            }
            Ok(None) => {
                *self.inner.snapshot.write() = Vec::new();
                self.publish_snapshot();
            }
            Err(e) => {
                warn!(error = %e, %slug, "Could not load persisted snapshot, starting empty");
                *self.inner.snapshot.write() = Vec::new();
                self.publish_snapshot();
            }
        }
    }

    pub(crate) fn inner(&self) -> &Arc<Inner> {
        &self.inner
    }
}

impl Inner {
    pub(crate) fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub(crate) fn remote(&self) -> &Arc<dyn RemoteAuthority> {
        &self.remote
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn NotificationSink> {
        &self.notifier
    }

    pub(crate) fn active(&self) -> &ActiveCredential {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::TracingSink;
    use crate::persistence::InMemoryStore;
    use crate::remote::wire::{
        CheckBasketResponse, ClassifyResponse, CreateResponse, ItemsResponse,
    };
    use async_trait::async_trait;

    /// Remote fake that echoes updates back, assigning ids.
    struct EchoRemote;

    #[async_trait]
    impl RemoteAuthority for EchoRemote {
        async fn check_basket_exists(&self, _slug: &str) -> Result<CheckBasketResponse, RemoteError> {
            Ok(CheckBasketResponse { exists: true, name: Some("Weekly".into()) })
        }

        async fn connect(&self, _slug: &str, _password: &str, _name: &str) -> Result<(), RemoteError> {
            Ok(())
        }

        async fn create(&self, _name: &str, slug: &str, _password: &str) -> Result<CreateResponse, RemoteError> {
            Ok(CreateResponse { success: true, slug: Some(slug.to_string()), error: None })
        }

        async fn fetch_items(&self, _slug: &str) -> Result<ItemsResponse, RemoteError> {
            Ok(ItemsResponse { success: true, products: vec![], error: None })
        }

        async fn update_items(
            &self,
            _slug: &str,
            products: &[ProductPayload],
        ) -> Result<ItemsResponse, RemoteError> {
            let products = products
                .iter()
                .enumerate()
                .map(|(i, p)| crate::remote::WireProduct {
                    id: p.id.clone().unwrap_or_else(|| format!("srv-{i}")),
                    name: p.name.clone(),
                    quantity: p.quantity,
                    is_added: p.is_added,
                    last_added_at: None,
                    times_added: None,
                    category: None,
                })
                .collect();
            Ok(ItemsResponse { success: true, products, error: None })
        }

        async fn delete_item(&self, _slug: &str, _id: &str) -> Result<ItemsResponse, RemoteError> {
            Ok(ItemsResponse { success: true, products: vec![], error: None })
        }

        async fn classify_product(&self, _id: &str) -> Result<ClassifyResponse, RemoteError> {
            Ok(ClassifyResponse { kind: None })
        }
    }

    fn test_engine() -> SyncEngine {
        let active = ActiveCredential::new();
        active.set(crate::credentials::ConnectedBasketCredential {
            name: "Weekly".into(),
            slug: "weekly".into(),
            password: "pw".into(),
        });
        SyncEngine::new(
            BasketConfig { status_display_ms: 10, ..Default::default() },
            Arc::new(InMemoryStore::new()),
            Arc::new(EchoRemote),
            Arc::new(TracingSink),
            active,
        )
    }

    #[tokio::test]
    async fn test_no_basket_selected() {
        let engine = SyncEngine::new(
            BasketConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(EchoRemote),
            Arc::new(TracingSink),
            ActiveCredential::new(),
        );
        assert!(matches!(
            engine.add_product("Milk").await,
            Err(EngineError::NoBasketSelected)
        ));
    }

    #[tokio::test]
    async fn test_add_product_assigns_remote_id() {
        let engine = test_engine();
        engine.add_product("Milk").await.unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "Milk");
        assert!(snapshot[0].id.is_some());
    }

    #[tokio::test]
    async fn test_add_blank_name_is_noop() {
        let engine = test_engine();
        engine.add_product("   ").await.unwrap();
        engine.add_product("!!!").await.unwrap();
        assert!(engine.snapshot().is_empty());
        assert_eq!(engine.generation(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_add_is_idempotent() {
        let engine = test_engine();
        engine.add_product("Milk").await.unwrap();
        let g = engine.generation();

        engine.add_product("milk!!").await.unwrap();

        assert_eq!(engine.snapshot().len(), 1);
        assert_eq!(engine.generation(), g, "duplicate add must not mutate");
    }

    #[tokio::test]
    async fn test_readd_reactivates_removed_item() {
        let engine = test_engine();
        engine.add_product("Milk").await.unwrap();
        let key = engine.snapshot()[0].key().to_string();

        engine.set_product_added(&key, false).await.unwrap();
        engine.set_product_quantity(&key, 4).await.unwrap();
        engine.add_product("MILK").await.unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.len(), 1, "reactivation must not duplicate");
        assert!(snapshot[0].is_added);
        assert_eq!(snapshot[0].quantity, 1, "reactivation resets quantity");
    }

    #[tokio::test]
    async fn test_quantity_clamped_to_one() {
        let engine = test_engine();
        engine.add_product("Milk").await.unwrap();
        let key = engine.snapshot()[0].key().to_string();

        engine.set_product_quantity(&key, 0).await.unwrap();

        assert_eq!(engine.snapshot()[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_remove_all_clears_added_flags_only() {
        let engine = test_engine();
        engine.add_product("Milk").await.unwrap();
        engine.add_product("Eggs").await.unwrap();

        engine.remove_all_from_active_list().await.unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.len(), 2, "history preserved");
        assert!(snapshot.iter().all(|i| !i.is_added));
    }

    #[tokio::test]
    async fn test_generation_strictly_increasing() {
        let engine = test_engine();
        engine.add_product("Milk").await.unwrap();
        let g1 = engine.generation();
        engine.add_product("Eggs").await.unwrap();
        let g2 = engine.generation();
        assert!(g2 > g1);
    }

    #[tokio::test]
    async fn test_input_buffer_cleared_on_commit() {
        let engine = test_engine();
        engine.set_new_product_input("Milk");
        engine.add_product("Milk").await.unwrap();
        assert!(engine.new_product_input().is_empty());
    }
}
