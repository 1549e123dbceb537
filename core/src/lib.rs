//! Catalog data access for NovaStream: films and series kept in a remote REST
//! store, mirrored into a local key-value slot that also serves as the
//! fallback whenever the remote store is missing or unreachable.

mod api;
mod error;
mod models;
mod repository;
mod storage;

pub use api::*;
pub use error::{CatalogError, Result};
pub use models::*;
pub use repository::*;
pub use storage::*;

/// Where the remote store lives. Both parts must be set for remote access.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into() }
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }
}
