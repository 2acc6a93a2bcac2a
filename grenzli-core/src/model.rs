//! Domain data structures for countries, geocoding hits, and batch outcomes.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::service::FetchError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// A country from the reference list.
pub struct Country {
    /// ISO 3166-1 short name, used as the geocoding query.
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    pub iso_code: String,
}

impl Country {
    /// Construct a country record.
    #[must_use]
    pub fn new<N: Into<String>, C: Into<String>>(name: N, iso_code: C) -> Self {
        Self {
            name: name.into(),
            iso_code: iso_code.into(),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.name, self.iso_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// OpenStreetMap element identifier as returned by the geocoder.
pub struct OsmId(pub u64);

impl OsmId {
    /// Identifier in the negated form the boundary API expects for relations.
    #[must_use]
    pub fn negated(self) -> String {
        format!("-{}", self.0)
    }
}

impl fmt::Display for OsmId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Location record returned by a geocoder for a free-text place name.
pub struct GeocodeResult {
    /// Display name reported by the geocoder.
    pub display_name: String,
    /// External administrative boundary identifier.
    pub osm_id: OsmId,
    /// OSM element type (`relation`, `way`, `node`) when reported.
    pub osm_type: Option<String>,
    /// Full attribute mapping as received.
    pub raw: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
/// Status and body of a boundary download.
pub struct BoundaryResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body, gzip compressed on success.
    pub body: Vec<u8>,
}

impl BoundaryResponse {
    /// Only an exact 200 counts as a usable download.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Pipeline step a country was in when it failed.
pub enum Stage {
    /// Geocoding the country name.
    Resolve,
    /// Building and sending the boundary download.
    Request,
    /// Writing the compressed payload to the staging directory.
    Persist,
    /// Decompressing into the output directory.
    Decompress,
}

impl fmt::Display for Stage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Resolve => "resolve",
            Stage::Request => "request",
            Stage::Persist => "persist",
            Stage::Decompress => "decompress",
        };
        write!(formatter, "{label}")
    }
}

#[derive(Debug)]
/// Terminal state of one country in a batch.
pub enum CountryOutcome {
    /// Output file written.
    Done {
        /// Location of the decompressed GeoJSON.
        output: PathBuf,
        /// Number of decompressed bytes written.
        bytes: u64,
    },
    /// The geocoder had no usable identifier for the country.
    Unresolved,
    /// The boundary API answered with something other than 200.
    BadStatus(u16),
    /// An error interrupted the pipeline.
    Failed {
        /// Step that failed.
        stage: Stage,
        /// Underlying error.
        error: FetchError,
    },
}

impl CountryOutcome {
    /// Whether the country produced an output file.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, CountryOutcome::Done { .. })
    }
}

#[derive(Debug, Default)]
/// Per-country outcomes of a batch run, in processing order.
pub struct BatchReport {
    /// Every processed country with its outcome.
    pub outcomes: Vec<(Country, CountryOutcome)>,
}

impl BatchReport {
    /// Number of countries with an output file.
    #[must_use]
    pub fn done(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_done())
            .count()
    }

    /// Number of countries skipped for any reason.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.done()
    }

    /// Outcome recorded for the given ISO code, if that country was processed.
    #[must_use]
    pub fn outcome_for(&self, iso_code: &str) -> Option<&CountryOutcome> {
        self.outcomes
            .iter()
            .find(|(country, _)| country.iso_code.eq_ignore_ascii_case(iso_code))
            .map(|(_, outcome)| outcome)
    }
}
