use async_trait::async_trait;
use thiserror::Error;

use super::wire::{CheckBasketResponse, ClassifyResponse, CreateResponse, ItemsResponse};
use crate::product::ProductPayload;

/// Failure talking to the remote authority.
///
/// `Rejected` carries the authority's own error message (explicit failure
/// flag, invalid credential); everything else is transport-level and gets a
/// generic user-facing message.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Rejected by remote authority: {message}")]
    Rejected { message: String },
    #[error("Unexpected status {0}")]
    Status(u16),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// The remote authority's basket endpoints.
///
/// Consumed as a black box: request in, response or failure out. The engine
/// resolves every failure into rollback + notification at its own boundary.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    async fn check_basket_exists(&self, slug: &str) -> Result<CheckBasketResponse, RemoteError>;

    async fn connect(&self, slug: &str, password: &str, name: &str) -> Result<(), RemoteError>;

    async fn create(&self, name: &str, slug: &str, password: &str) -> Result<CreateResponse, RemoteError>;

    /// Fetch the canonical item list for a basket.
    async fn fetch_items(&self, slug: &str) -> Result<ItemsResponse, RemoteError>;

    /// Replace the basket's items; the response carries the canonical list
    /// with authority-assigned ids.
    async fn update_items(&self, slug: &str, products: &[ProductPayload]) -> Result<ItemsResponse, RemoteError>;

    /// Permanently delete one item; the response carries the canonical list.
    async fn delete_item(&self, slug: &str, product_id: &str) -> Result<ItemsResponse, RemoteError>;

    /// Ask the external classifier for a product's category.
    async fn classify_product(&self, product_id: &str) -> Result<ClassifyResponse, RemoteError>;
}
