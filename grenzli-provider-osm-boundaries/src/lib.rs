//! Boundary download provider for the osm-boundaries.com API.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};

use grenzli_core::{
    model::BoundaryResponse,
    ports::{BoundaryPort, PortError},
    request::DownloadRequest,
};

/// Downloads compressed boundary files over HTTP.
pub struct OsmBoundariesSource {
    client: Client,
}

impl OsmBoundariesSource {
    /// Create a source from a client builder carrying user agent, timeout, etc.
    ///
    /// Transparent response decoding is switched off on the builder: the
    /// payload is staged as the gzip file the API sent, even when it is
    /// labelled `Content-Encoding: gzip`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Network`] when the client cannot be built.
    pub fn new(builder: ClientBuilder) -> Result<Self, PortError> {
        let client = builder.no_gzip().no_brotli().no_deflate().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BoundaryPort for OsmBoundariesSource {
    async fn download(&self, request: &DownloadRequest) -> Result<BoundaryResponse, PortError> {
        let url = request.url()?;

        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        if status != 200 {
            // Body is never processed for failed downloads.
            log::debug!("osm-boundaries answered {status} for {request}");
            return Ok(BoundaryResponse {
                status,
                body: Vec::new(),
            });
        }

        let body = resp.bytes().await?.to_vec();
        Ok(BoundaryResponse { status, body })
    }
}
