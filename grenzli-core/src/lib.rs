//! Core types and the batch fetcher for the grenzli boundary downloader.

/// Fetch configuration shared by the batch and its callers.
pub mod config;
/// Static ISO 3166-1 reference list of countries.
pub mod countries;
/// Domain models and identifiers shared by all providers.
pub mod model;
/// Country name to file name normalization.
pub mod naming;
/// Traits describing the external collaborators.
pub mod ports;
/// Boundary download request construction and presets.
pub mod request;
/// Sequential fetch-decompress-persist pipeline.
pub mod service;
/// Staging and output directory handling.
pub mod storage;

pub use config::*;
pub use model::*;
pub use naming::*;
pub use ports::*;
pub use request::*;
pub use service::*;
pub use storage::*;
