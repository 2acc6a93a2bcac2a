//! Run-wide settings for a batch.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::naming::FileNaming;
use crate::request::{DEFAULT_BOUNDARIES_URL, RequestPreset};
use crate::storage::Storage;

#[derive(Clone, Deserialize)]
#[serde(default)]
/// Everything the batch fetcher needs besides its ports.
pub struct FetchConfig {
    /// Operator secret for the boundary API. Read once, never logged.
    pub api_key: String,
    /// Boundary API endpoint.
    pub boundaries_url: String,
    /// Query flag preset.
    pub preset: RequestPreset,
    /// Optional `db` dataset pin.
    pub database: Option<String>,
    /// Directory for compressed downloads.
    pub staging_dir: PathBuf,
    /// Directory for decompressed GeoJSON.
    pub output_dir: PathBuf,
    /// File stem scheme.
    pub naming: FileNaming,
}

impl FetchConfig {
    /// Defaults with the given API key.
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Storage bound to the configured directories.
    #[must_use]
    pub fn storage(&self) -> Storage {
        Storage::new(&self.staging_dir, &self.output_dir)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            boundaries_url: DEFAULT_BOUNDARIES_URL.to_owned(),
            preset: RequestPreset::default(),
            database: None,
            staging_dir: PathBuf::from("gz"),
            output_dir: PathBuf::from("geojson"),
            naming: FileNaming::default(),
        }
    }
}

// Hand-written so the key never ends up in debug logs.
impl fmt::Debug for FetchConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FetchConfig")
            .field("api_key", &"***")
            .field("boundaries_url", &self.boundaries_url)
            .field("preset", &self.preset)
            .field("database", &self.database)
            .field("staging_dir", &self.staging_dir)
            .field("output_dir", &self.output_dir)
            .field("naming", &self.naming)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_layout() {
        let config = FetchConfig::with_api_key("k");
        assert_eq!(config.staging_dir, PathBuf::from("gz"));
        assert_eq!(config.output_dir, PathBuf::from("geojson"));
        assert_eq!(config.preset, RequestPreset::Simplified);
        assert_eq!(config.naming, FileNaming::Name);
        assert_eq!(config.boundaries_url, DEFAULT_BOUNDARIES_URL);
    }

    #[test]
    fn debug_output_masks_key() {
        let shown = format!("{:?}", FetchConfig::with_api_key("hunter2"));
        assert!(!shown.contains("hunter2"), "key leaked: {shown}");
    }

    #[test]
    fn deserializes_partial_json() {
        let config: FetchConfig = serde_json::from_str(
            r#"{"api_key":"abc","preset":"land-only","naming":"iso-code","database":"osm20200907"}"#,
        )
        .unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.preset, RequestPreset::LandOnly);
        assert_eq!(config.naming, FileNaming::IsoCode);
        assert_eq!(config.database.as_deref(), Some("osm20200907"));
        assert_eq!(config.output_dir, PathBuf::from("geojson"));
    }
}
