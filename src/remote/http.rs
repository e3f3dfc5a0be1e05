//! HTTP client for the remote authority.
//!
//! Every request carries the active basket's identifying headers
//! (`X-Basket-Slug`, `X-Basket-Password`) pulled from the shared
//! [`ActiveCredential`] slot at send time.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use tracing::debug;

use super::traits::{RemoteAuthority, RemoteError};
use super::wire::{
    CheckBasketResponse, ClassifyResponse, ConnectRequest, ConnectResponse, CreateRequest,
    CreateResponse, ItemsResponse, UpdateItemsRequest,
};
use crate::credentials::ActiveCredential;
use crate::product::ProductPayload;

pub struct HttpRemoteAuthority {
    client: reqwest::Client,
    base_url: String,
    active: ActiveCredential,
}

impl HttpRemoteAuthority {
    pub fn new(base_url: impl Into<String>, active: ActiveCredential) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            active,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_credentials(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.active.get() {
            Some(cred) => builder
                .header("X-Basket-Slug", cred.slug)
                .header("X-Basket-Password", cred.password),
            None => builder,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }

    /// Turn an explicit failure flag into a `Rejected` error.
    fn check_items_success(resp: ItemsResponse) -> Result<ItemsResponse, RemoteError> {
        if resp.success {
            Ok(resp)
        } else {
            Err(RemoteError::Rejected {
                message: resp.error.unwrap_or_else(|| "request rejected".to_string()),
            })
        }
    }
}

#[async_trait]
impl RemoteAuthority for HttpRemoteAuthority {
    async fn check_basket_exists(&self, slug: &str) -> Result<CheckBasketResponse, RemoteError> {
        let url = self.url(&format!("/api/basket/check-if-basket-exists/{slug}"));
        debug!(%url, "check_basket_exists");
        let response = self.with_credentials(self.client.get(&url)).send().await?;
        Self::decode(response).await
    }

    async fn connect(&self, slug: &str, password: &str, name: &str) -> Result<(), RemoteError> {
        let url = self.url("/api/basket/connect");
        let body = ConnectRequest {
            slug: slug.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        let response = self
            .with_credentials(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        let resp: ConnectResponse = Self::decode(response).await?;
        if resp.success {
            Ok(())
        } else {
            Err(RemoteError::Rejected {
                message: resp.error.unwrap_or_else(|| "invalid credentials".to_string()),
            })
        }
    }

    async fn create(&self, name: &str, slug: &str, password: &str) -> Result<CreateResponse, RemoteError> {
        let url = self.url("/api/basket/create");
        let body = CreateRequest {
            name: name.to_string(),
            slug: slug.to_string(),
            password: password.to_string(),
        };
        let response = self
            .with_credentials(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        let resp: CreateResponse = Self::decode(response).await?;
        if resp.success {
            Ok(resp)
        } else {
            Err(RemoteError::Rejected {
                message: resp.error.unwrap_or_else(|| "could not create basket".to_string()),
            })
        }
    }

    async fn fetch_items(&self, slug: &str) -> Result<ItemsResponse, RemoteError> {
        let url = self.url(&format!("/api/basket/{slug}"));
        let response = self.with_credentials(self.client.get(&url)).send().await?;
        Self::check_items_success(Self::decode(response).await?)
    }

    async fn update_items(&self, slug: &str, products: &[ProductPayload]) -> Result<ItemsResponse, RemoteError> {
        let url = self.url(&format!("/api/basket/{slug}/products"));
        let body = UpdateItemsRequest {
            products: products.to_vec(),
        };
        let response = self
            .with_credentials(self.client.put(&url))
            .json(&body)
            .send()
            .await?;
        Self::check_items_success(Self::decode(response).await?)
    }

    async fn delete_item(&self, slug: &str, product_id: &str) -> Result<ItemsResponse, RemoteError> {
        let url = self.url(&format!("/api/basket/{slug}/products/{product_id}"));
        let response = self.with_credentials(self.client.delete(&url)).send().await?;
        Self::check_items_success(Self::decode(response).await?)
    }

    async fn classify_product(&self, product_id: &str) -> Result<ClassifyResponse, RemoteError> {
        let url = self.url(&format!("/api/products/{product_id}/classify"));
        let response = self.with_credentials(self.client.get(&url)).send().await?;
        Self::decode(response).await
    }
}
