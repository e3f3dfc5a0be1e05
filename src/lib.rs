//! # basketi-sync
//!
//! Client-side synchronization engine for shared, slug-addressed shopping
//! baskets, built to stay usable under poor or absent connectivity while a
//! remote authority remains the source of truth.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SyncEngine                            │
//! │  • Optimistic mutations with rollback                      │
//! │  • Generation counter guards overlapping operations        │
//! │  • Background poller reconciles with the authority         │
//! └─────────────────────────────────────────────────────────────┘
//!            │                                │
//!            ▼                                ▼
//! ┌─────────────────────────┐   ┌─────────────────────────────┐
//! │    SnapshotStore        │   │     RemoteAuthority         │
//! │  Durable local snapshot │   │  Canonical list + metadata  │
//! │  per basket slug        │   │  (HTTP, credential headers) │
//! └─────────────────────────┘   └─────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │              RequestInterceptionProxy (orthogonal)          │
//! │  Versioned cache of the application shell and assets:       │
//! │  network-first navigations, cache-first assets,             │
//! │  version-bump garbage collection                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use basketi_sync::{
//!     ActiveCredential, BackgroundPoller, BasketConfig, HttpRemoteAuthority,
//!     JsonFileStore, SyncEngine, TracingSink,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = BasketConfig {
//!         api_base_url: "https://basketi.example".into(),
//!         ..Default::default()
//!     };
//!
//!     let active = ActiveCredential::new();
//!     let store = Arc::new(JsonFileStore::new("./data", &config.storage_prefix));
//!     let remote = Arc::new(HttpRemoteAuthority::new(&config.api_base_url, active.clone()));
//!     let engine = SyncEngine::new(config, store, remote, Arc::new(TracingSink), active);
//!
//!     if engine.connect_basket("weekly", "hunter2").await {
//!         engine.add_product("Milk").await.unwrap();
//!     }
//!
//!     // Keep the list fresh while the app is open
//!     let poller = BackgroundPoller::start(engine.clone());
//!     // ... application runs ...
//!     poller.shutdown().await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`engine`]: the [`SyncEngine`] coordinator and [`BackgroundPoller`]
//! - [`persistence`]: durable snapshot/credential storage backends
//! - [`remote`]: the remote authority's endpoints behind a trait
//! - [`proxy`]: the versioned cache proxy for the application's own delivery
//! - [`notify`]: user-visible notification sink

pub mod config;
pub mod credentials;
pub mod engine;
pub mod metrics;
pub mod notify;
pub mod persistence;
pub mod product;
pub mod proxy;
pub mod remote;

pub use config::BasketConfig;
pub use credentials::{ActiveCredential, ConnectedBasketCredential};
pub use engine::{BackgroundPoller, EngineError, SyncEngine, SyncStatus};
pub use notify::{Notification, NotificationSink, TracingSink};
pub use persistence::{InMemoryStore, JsonFileStore, SnapshotStore, StorageError};
pub use product::{clamp_quantity, normalize_name, ProductLineItem, ProductPayload};
pub use proxy::{
    CacheStorage, CacheStore, CachedResponse, FetchError, Fetcher, HttpFetcher,
    InMemoryCacheStorage, ProxyError, ProxyState, Request, RequestClass,
    RequestInterceptionProxy,
};
pub use remote::{HttpRemoteAuthority, ItemsResponse, RemoteAuthority, RemoteError, WireProduct};
