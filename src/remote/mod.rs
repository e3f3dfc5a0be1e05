//! Remote authority client: trait, wire types, HTTP implementation.

pub mod http;
pub mod traits;
pub mod wire;

pub use http::HttpRemoteAuthority;
pub use traits::{RemoteAuthority, RemoteError};
pub use wire::{CheckBasketResponse, ClassifyResponse, CreateResponse, ItemsResponse, WireProduct};
