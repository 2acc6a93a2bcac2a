//! grenzli: downloads administrative boundary GeoJSON for every country.
//!
//! Each country is geocoded through Nominatim, its boundary file requested
//! from osm-boundaries.com, decompressed into the output directory, and the
//! compressed download removed again. Countries are processed one after the
//! other; a failure is logged and the batch moves on.
//!
//! Usage examples
//! --------------
//!
//! - Fetch all countries into `gz/` and `geojson/`
//!   $ OSM_BOUNDARIES_API_KEY=... grenzli
//!
//! - A few countries, named by ISO code, land-only geometry
//!   $ grenzli --only DE,CH,AT --naming iso-code --preset land-only

mod args;
mod key;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use reqwest::{Client, ClientBuilder};

use grenzli_core::{countries, service::BatchFetcher};
use grenzli_provider_nominatim::NominatimGeocoder;
use grenzli_provider_osm_boundaries::OsmBoundariesSource;

use crate::args::CliArgs;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let countries = if args.only.is_empty() {
        countries::all()
    } else {
        countries::select(&args.only)?
    };

    let api_key = key::resolve_api_key(args.api_key.clone(), io::stdin().lock(), io::stderr())?;
    let config = args.fetch_config(api_key);
    log::debug!("{config:?}");

    let storage = config.storage();
    if args.no_create_dirs {
        storage.check_dirs()?;
    } else {
        storage.create_dirs()?;
    }

    // HTTP setup: the boundary source builds its own non-decoding client
    let geocoder_client = client_builder(&args)
        .build()
        .context("failed to build HTTP client")?;
    let geocoder = Arc::new(NominatimGeocoder::with_base_url(
        geocoder_client,
        args.nominatim_url.as_str(),
    ));
    let boundaries = Arc::new(
        OsmBoundariesSource::new(client_builder(&args))
            .context("failed to build boundary download client")?,
    );
    let fetcher = BatchFetcher::new(geocoder, boundaries, config);

    log::info!("fetching boundaries for {} countries", countries.len());
    let report = fetcher.run(&countries).await;

    // Exit status does not reflect per-country failures.
    if report.done() == 0 && !countries.is_empty() {
        log::warn!("no country was downloaded");
    }
    Ok(())
}

fn client_builder(args: &CliArgs) -> ClientBuilder {
    let builder = Client::builder().user_agent(args.user_agent.as_str());
    match args.timeout_secs {
        Some(secs) => builder.timeout(Duration::from_secs(secs)),
        None => builder,
    }
}
