//! Basket connect/create/select flows.
//!
//! These wrap the remote authority's basket endpoints and maintain the local
//! credential book: every successful connect or create upserts a
//! `{name, slug, password}` entry keyed by slug and selects the basket.

use tracing::{info, warn};

use super::SyncEngine;
use crate::credentials::ConnectedBasketCredential;
use crate::notify::Notification;

impl SyncEngine {
    /// Check whether a basket with this slug exists.
    ///
    /// A transport failure reads as "not found" to the user, matching the
    /// offline-first posture: the answer is simply unavailable.
    #[tracing::instrument(skip(self))]
    pub async fn check_basket_exists(&self, slug: &str) -> bool {
        match self.inner().remote().check_basket_exists(slug).await {
            Ok(resp) => resp.exists,
            Err(e) => {
                warn!(error = %e, %slug, "Basket existence check failed");
                crate::metrics::record_operation("engine", "check_exists", "error");
                false
            }
        }
    }

    /// Connect to an existing basket with its shared password.
    ///
    /// On success the credential is stored (password overwritten in place if
    /// the slug was known), the basket becomes the selection, any persisted
    /// snapshot is loaded for instant display, and a foreground refresh
    /// reconciles it with the authority. Returns whether the connect took.
    #[tracing::instrument(skip(self, password))]
    pub async fn connect_basket(&self, slug: &str, password: &str) -> bool {
        let check = match self.inner().remote().check_basket_exists(slug).await {
            Ok(resp) if resp.exists => resp,
            Ok(_) => {
                self.inner()
                    .notifier()
                    .notify(Notification::Error("Basket not found".into()))
                    .await;
                return false;
            }
            Err(e) => {
                warn!(error = %e, %slug, "Basket lookup failed");
                self.inner()
                    .notifier()
                    .notify(Notification::Error("Basket not found".into()))
                    .await;
                return false;
            }
        };

        let name = check.name.unwrap_or_else(|| slug.to_string());
        if let Err(e) = self.inner().remote().connect(slug, password, &name).await {
            warn!(error = %e, %slug, "Connect rejected");
            self.notify_remote_failure(&e).await;
            crate::metrics::record_operation("engine", "connect", "error");
            return false;
        }

        let credential = ConnectedBasketCredential {
            name: name.clone(),
            slug: slug.to_string(),
            password: password.to_string(),
        };
        self.select_with_credential(credential).await;

        info!(%slug, "Connected to basket");
        crate::metrics::record_operation("engine", "connect", "success");
        self.inner()
            .notifier()
            .notify(Notification::Info(format!("Connected to {name}")))
            .await;
        true
    }

    /// Create a new basket and select it.
    #[tracing::instrument(skip(self, password))]
    pub async fn create_basket(&self, name: &str, slug: &str, password: &str) -> bool {
        let resp = match self.inner().remote().create(name, slug, password).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, %slug, "Create rejected");
                self.notify_remote_failure(&e).await;
                crate::metrics::record_operation("engine", "create", "error");
                return false;
            }
        };

        // The authority may normalize the slug it actually assigned.
        let slug = resp.slug.unwrap_or_else(|| slug.to_string());
        let credential = ConnectedBasketCredential {
            name: name.to_string(),
            slug: slug.clone(),
            password: password.to_string(),
        };
        self.select_with_credential(credential).await;

        info!(%slug, "Created basket");
        crate::metrics::record_operation("engine", "create", "success");
        self.inner()
            .notifier()
            .notify(Notification::Info(format!("Created {name}")))
            .await;
        true
    }

    /// Re-select a previously connected basket from the credential book.
    ///
    /// Used on session restore: the persisted snapshot shows immediately,
    /// then a foreground refresh reconciles it. Returns `false` if the slug
    /// was never connected.
    #[tracing::instrument(skip(self))]
    pub async fn select_basket(&self, slug: &str) -> bool {
        let book = match self.inner().store().load_credentials().await {
            Ok(book) => book,
            Err(e) => {
                warn!(error = %e, "Could not load credential book");
                return false;
            }
        };

        let Some(credential) = book.into_iter().find(|c| c.slug == slug) else {
            return false;
        };
        self.select_with_credential(credential).await;
        true
    }

    /// Every credential the client has ever connected with.
    pub async fn connected_baskets(&self) -> Vec<ConnectedBasketCredential> {
        self.inner().store().load_credentials().await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not load credential book");
            Vec::new()
        })
    }

    async fn select_with_credential(&self, credential: ConnectedBasketCredential) {
        if let Err(e) = self.inner().store().save_credential(&credential).await {
            warn!(error = %e, "Could not persist credential, continuing");
        }
        let slug = credential.slug.clone();
        self.inner().active().set(credential);

        self.load_persisted_snapshot(&slug).await;
        // Reconcile with the authority; offline just keeps the local view.
        let _ = self.refresh(false).await;
    }
}
