//! Traits describing the geocoding and boundary download collaborators.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;

use crate::model::{BoundaryResponse, GeocodeResult};
use crate::request::DownloadRequest;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to external services.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] JsonError),
    /// Request URL could not be assembled.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
/// Resolves free-text place names to OSM identifiers.
pub trait GeocodePort: Send + Sync {
    /// Look up a place by name.
    ///
    /// Returns `Ok(None)` when there is no match or the match carries no
    /// `osm_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the lookup itself fails.
    async fn resolve(&self, query: &str) -> Result<Option<GeocodeResult>, PortError>;
}

#[async_trait]
/// Downloads compressed boundary files.
pub trait BoundaryPort: Send + Sync {
    /// Issue the download and hand back status and raw body.
    ///
    /// Non-200 statuses are returned, not raised.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request cannot be sent or the body
    /// cannot be read.
    async fn download(&self, request: &DownloadRequest) -> Result<BoundaryResponse, PortError>;
}
