use thiserror::Error;

/// Everything that can go wrong talking to the remote store or the local slot.
///
/// Variants carry rendered messages rather than source errors so a failure can
/// be cloned into a [`crate::LoadReport`] after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("remote store is not configured")]
    NotConfigured,
    #[error("remote store answered HTTP {status}: {body}")]
    RemoteRequest { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("remote store echoed no row for the created item")]
    EmptyResponse,
    #[error("local storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Decode(e.to_string())
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CatalogError::Decode(e.to_string())
        } else {
            CatalogError::Transport(e.to_string())
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
