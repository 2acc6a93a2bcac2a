use std::path::PathBuf;

use clap::Parser;
use grenzli_core::{
    config::FetchConfig, naming::FileNaming, request::DEFAULT_BOUNDARIES_URL,
    request::RequestPreset,
};
use grenzli_provider_nominatim::DEFAULT_BASE_URL as DEFAULT_NOMINATIM_URL;

/// CLI arguments for grenzli
#[derive(Debug, Parser)]
#[command(
    name = "grenzli",
    version,
    about = "Download administrative boundary GeoJSON for every country"
)]
pub(crate) struct CliArgs {
    /// osm-boundaries API key; prompted for when absent
    #[arg(long, env = "OSM_BOUNDARIES_API_KEY", hide_env_values = true)]
    pub(crate) api_key: Option<String>,

    /// Directory for downloaded .gz files
    #[arg(long, default_value = "gz")]
    pub(crate) staging_dir: PathBuf,

    /// Directory for decompressed .geojson files
    #[arg(long, default_value = "geojson")]
    pub(crate) output_dir: PathBuf,

    /// Query preset: simplified or land-only
    #[arg(long, default_value_t = RequestPreset::Simplified)]
    pub(crate) preset: RequestPreset,

    /// Pin a dataset on the boundary API (e.g. osm20200907)
    #[arg(long)]
    pub(crate) db: Option<String>,

    /// File naming: name or iso-code
    #[arg(long, default_value_t = FileNaming::Name)]
    pub(crate) naming: FileNaming,

    /// Comma-separated ISO alpha-2 codes to restrict the batch to (e.g. DE,CH,AT)
    #[arg(long, value_delimiter = ',')]
    pub(crate) only: Vec<String>,

    /// Boundary API endpoint
    #[arg(long, default_value = DEFAULT_BOUNDARIES_URL)]
    pub(crate) boundaries_url: String,

    /// Nominatim base URL
    #[arg(long, default_value = DEFAULT_NOMINATIM_URL)]
    pub(crate) nominatim_url: String,

    /// User agent sent to both services
    #[arg(long, default_value = concat!("grenzli/", env!("CARGO_PKG_VERSION")))]
    pub(crate) user_agent: String,

    /// Per-request timeout in seconds (none by default)
    #[arg(long)]
    pub(crate) timeout_secs: Option<u64>,

    /// Fail instead of creating missing directories
    #[arg(long)]
    pub(crate) no_create_dirs: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl CliArgs {
    pub(crate) fn fetch_config(&self, api_key: String) -> FetchConfig {
        FetchConfig {
            api_key,
            boundaries_url: self.boundaries_url.clone(),
            preset: self.preset,
            database: self.db.clone(),
            staging_dir: self.staging_dir.clone(),
            output_dir: self.output_dir.clone(),
            naming: self.naming,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_original_layout() {
        let args = CliArgs::try_parse_from(["grenzli", "--api-key", "k"]).unwrap();
        let config = args.fetch_config("k".to_owned());

        assert_eq!(config.staging_dir, PathBuf::from("gz"));
        assert_eq!(config.output_dir, PathBuf::from("geojson"));
        assert_eq!(config.preset, RequestPreset::Simplified);
        assert_eq!(config.naming, FileNaming::Name);
        assert!(args.only.is_empty());
        assert!(args.timeout_secs.is_none());
    }

    #[test]
    fn parses_presets_and_filters() {
        let args = CliArgs::try_parse_from([
            "grenzli",
            "--preset",
            "land-only",
            "--db",
            "osm20200907",
            "--naming",
            "iso-code",
            "--only",
            "de,CH",
            "--timeout-secs",
            "30",
        ])
        .unwrap();

        assert_eq!(args.preset, RequestPreset::LandOnly);
        assert_eq!(args.naming, FileNaming::IsoCode);
        assert_eq!(args.db.as_deref(), Some("osm20200907"));
        assert_eq!(args.only, vec!["de".to_owned(), "CH".to_owned()]);
        assert_eq!(args.timeout_secs, Some(30));
    }

    #[test]
    fn rejects_unknown_preset() {
        assert!(CliArgs::try_parse_from(["grenzli", "--preset", "everything"]).is_err());
    }
}
