//! Wire types for the remote authority's endpoints.
//!
//! The authority is a black box: these are its documented request and
//! response bodies, nothing more.

use serde::{Deserialize, Serialize};

use crate::product::{clamp_quantity, ProductLineItem, ProductPayload};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBasketResponse {
    pub exists: bool,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub slug: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub success: bool,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub name: String,
    pub slug: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemsRequest {
    pub products: Vec<ProductPayload>,
}

/// Canonical item list as the authority returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub products: Vec<WireProduct>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    pub id: String,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default = "default_true")]
    pub is_added: bool,
    #[serde(default)]
    pub last_added_at: Option<i64>,
    #[serde(default)]
    pub times_added: Option<u64>,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl From<WireProduct> for ProductLineItem {
    fn from(wire: WireProduct) -> Self {
        let mut item = ProductLineItem::new(wire.name);
        item.id = Some(wire.id);
        item.quantity = clamp_quantity(wire.quantity);
        item.is_added = wire.is_added;
        if let Some(at) = wire.last_added_at {
            item.last_added_at = at;
        }
        if let Some(times) = wire.times_added {
            item.times_added = times;
        }
        item.category = wire.category;
        item
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}
