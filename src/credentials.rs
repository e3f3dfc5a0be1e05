//! Connected-basket credentials.
//!
//! Every basket the client has ever connected to leaves a credential behind,
//! keyed by slug. Reconnecting overwrites the password in place rather than
//! duplicating the entry.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Credential for one connected basket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedBasketCredential {
    /// Display name of the basket
    pub name: String,
    /// Unique slug addressing the basket
    pub slug: String,
    /// Shared password, sent on every request to the remote authority
    pub password: String,
}

/// Shared slot holding the currently selected basket's credential.
///
/// The engine writes it on connect/create; the HTTP client reads it to
/// attach the identifying headers to every outgoing request.
#[derive(Debug, Clone, Default)]
pub struct ActiveCredential {
    inner: Arc<RwLock<Option<ConnectedBasketCredential>>>,
}

impl ActiveCredential {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, credential: ConnectedBasketCredential) {
        *self.inner.write() = Some(credential);
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    #[must_use]
    pub fn get(&self) -> Option<ConnectedBasketCredential> {
        self.inner.read().clone()
    }

    /// Slug of the currently selected basket, if any.
    #[must_use]
    pub fn slug(&self) -> Option<String> {
        self.inner.read().as_ref().map(|c| c.slug.clone())
    }
}

/// Upsert a credential into a book of credentials, keyed by slug.
///
/// Returns `true` if an existing entry was overwritten.
pub fn upsert_credential(
    book: &mut Vec<ConnectedBasketCredential>,
    credential: ConnectedBasketCredential,
) -> bool {
    if let Some(existing) = book.iter_mut().find(|c| c.slug == credential.slug) {
        *existing = credential;
        true
    } else {
        book.push(credential);
        false
    }
}
