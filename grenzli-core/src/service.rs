//! Batch fetcher driving resolve, download, decompress, and persist per country.

use std::io::Error as IoError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::FetchConfig;
use crate::model::{BatchReport, Country, CountryOutcome, Stage};
use crate::ports::{BoundaryPort, GeocodePort, PortError};
use crate::request::DownloadRequest;
use crate::storage::Storage;

#[derive(thiserror::Error, Debug)]
/// Errors raised inside a single country's pipeline run.
pub enum FetchError {
    /// A port call failed.
    #[error(transparent)]
    Port(#[from] PortError),
    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: IoError,
    },
    /// Staged payload is not a valid gzip stream.
    #[error("could not decompress {}: {source}", path.display())]
    Decompress {
        /// Staging file being read.
        path: PathBuf,
        /// Underlying error.
        source: IoError,
    },
    /// A required directory does not exist.
    #[error("directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),
}

/// Sequentially fetches boundaries for a list of countries.
pub struct BatchFetcher {
    geocoder: Arc<dyn GeocodePort>,
    boundaries: Arc<dyn BoundaryPort>,
    config: FetchConfig,
    storage: Storage,
}

impl BatchFetcher {
    /// Create a fetcher bound to the given collaborators and settings.
    #[must_use]
    pub fn new(
        geocoder: Arc<dyn GeocodePort>,
        boundaries: Arc<dyn BoundaryPort>,
        config: FetchConfig,
    ) -> Self {
        let storage = config.storage();
        Self {
            geocoder,
            boundaries,
            config,
            storage,
        }
    }

    /// Settings the fetcher runs with.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Process every country in order, one at a time.
    ///
    /// Failures are logged and recorded per country; none stops the batch.
    pub async fn run(&self, countries: impl IntoIterator<Item = &Country>) -> BatchReport {
        let mut report = BatchReport::default();
        for country in countries {
            let outcome = self.fetch_one(country).await;
            log_outcome(country, &outcome);
            report.outcomes.push((country.clone(), outcome));
        }
        log::info!(
            "batch finished: {} downloaded, {} skipped",
            report.done(),
            report.skipped()
        );
        report
    }

    /// Run the pipeline for a single country.
    pub async fn fetch_one(&self, country: &Country) -> CountryOutcome {
        let location = match self.geocoder.resolve(&country.name).await {
            Ok(Some(location)) => location,
            Ok(None) => return CountryOutcome::Unresolved,
            Err(err) => return failed(Stage::Resolve, err),
        };
        log::debug!(
            "{} resolved to {} (osm_id {})",
            country.name,
            location.display_name,
            location.osm_id
        );

        let request = DownloadRequest::new(
            self.config.boundaries_url.as_str(),
            self.config.api_key.as_str(),
            self.config.database.clone(),
            location.osm_id,
            self.config.preset,
        );
        log::info!("Downloading: {request}");

        let response = match self.boundaries.download(&request).await {
            Ok(response) => response,
            Err(err) => return failed(Stage::Request, err),
        };
        if !response.is_ok() {
            return CountryOutcome::BadStatus(response.status);
        }
        log::debug!("{}: received {} bytes", country.name, response.body.len());

        let stem = self.config.naming.file_stem(country);
        let staging = match self.storage.write_staging(&stem, &response.body) {
            Ok(path) => path,
            Err(err) => {
                self.cleanup(&self.storage.staging_path(&stem));
                return failed(Stage::Persist, err);
            }
        };

        let decompressed = self.storage.decompress(&staging, &stem);
        let removed = self.storage.remove_staging(&staging);
        settle(decompressed, removed)
    }

    fn cleanup(&self, staging: &Path) {
        if let Err(err) = self.storage.remove_staging(staging) {
            log::warn!("{err}");
        }
    }
}

/// Outcome once decompression and staging cleanup both ran. A complete
/// output file is kept even when the staging file could not be removed.
fn settle(
    decompressed: Result<(PathBuf, u64), FetchError>,
    removed: Result<(), FetchError>,
) -> CountryOutcome {
    if let Err(err) = &removed {
        log::warn!("{err}");
    }
    match decompressed {
        Ok((output, bytes)) => CountryOutcome::Done { output, bytes },
        Err(err) => failed(Stage::Decompress, err),
    }
}

fn failed(stage: Stage, error: impl Into<FetchError>) -> CountryOutcome {
    CountryOutcome::Failed {
        stage,
        error: error.into(),
    }
}

fn log_outcome(country: &Country, outcome: &CountryOutcome) {
    match outcome {
        CountryOutcome::Done { output, bytes } => {
            log::info!(
                "Downloaded {} -> {} ({bytes} bytes)",
                country.name,
                output.display()
            );
        }
        CountryOutcome::Unresolved => {
            log::warn!("{}: geocoder returned no osm_id, skipping", country.name);
        }
        CountryOutcome::BadStatus(status) => {
            log::warn!(
                "{}: did not receive HTTP 200 (got {status}), skipping",
                country.name
            );
        }
        CountryOutcome::Failed { stage, error } => {
            log::error!("Could not download {} ({stage}): {error}", country.name);
        }
    }
}
