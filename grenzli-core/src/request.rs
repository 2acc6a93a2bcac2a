//! Boundary download request construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::{Url, form_urlencoded};

use crate::model::OsmId;
use crate::ports::PortError;

/// Default endpoint of the osm-boundaries download API.
pub const DEFAULT_BOUNDARIES_URL: &str = "https://osm-boundaries.com/Download/Submit";

const MIN_ADMIN_LEVEL: u8 = 2;
const MAX_ADMIN_LEVEL: u8 = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Named sets of query flags accepted by the boundary API.
pub enum RequestPreset {
    /// All tags, simplified geometry.
    #[default]
    Simplified,
    /// Land-only geometry, default tags.
    LandOnly,
}

impl RequestPreset {
    /// Query parameters after `osmIds`. `None` values render as bare flags.
    #[must_use]
    pub fn params(self) -> Vec<(&'static str, Option<String>)> {
        let mut params = vec![
            ("recursive", None),
            ("minAdminLevel", Some(MIN_ADMIN_LEVEL.to_string())),
            ("maxAdminLevel", Some(MAX_ADMIN_LEVEL.to_string())),
        ];
        match self {
            RequestPreset::Simplified => {
                params.push(("includeAllTags", None));
                params.push(("simplify", Some("1".to_owned())));
            }
            RequestPreset::LandOnly => params.push(("landOnly", None)),
        }
        params
    }
}

impl fmt::Display for RequestPreset {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            RequestPreset::Simplified => "simplified",
            RequestPreset::LandOnly => "land-only",
        };
        write!(formatter, "{slug}")
    }
}

impl FromStr for RequestPreset {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simplified" => Ok(RequestPreset::Simplified),
            "land-only" | "landonly" => Ok(RequestPreset::LandOnly),
            other => Err(format!("unknown request preset: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
/// One boundary download, built per country and never reused.
pub struct DownloadRequest {
    base_url: String,
    api_key: String,
    database: Option<String>,
    osm_id: OsmId,
    preset: RequestPreset,
}

impl DownloadRequest {
    /// Build a request for the given identifier.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        database: Option<String>,
        osm_id: OsmId,
        preset: RequestPreset,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            database,
            osm_id,
            preset,
        }
    }

    /// Identifier the request targets.
    #[must_use]
    pub fn osm_id(&self) -> OsmId {
        self.osm_id
    }

    /// Full request URL including the API key.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidUrl`] when the base URL does not parse.
    pub fn url(&self) -> Result<Url, PortError> {
        self.render(&self.api_key)
    }

    /// Request URL with the API key masked, for logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        self.render("***")
            .map_or_else(|_| self.base_url.clone(), String::from)
    }

    fn render(&self, key: &str) -> Result<Url, PortError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| PortError::InvalidUrl(format!("{}: {err}", self.base_url)))?;

        // Built by hand: the API takes bare flags (`&recursive`) which the
        // form serializer would render as `recursive=`.
        let mut query = format!("apiKey={}", encode(key));
        if let Some(database) = &self.database {
            query.push_str("&db=");
            query.push_str(&encode(database));
        }
        query.push_str("&osmIds=");
        query.push_str(&self.osm_id.negated());
        for (name, value) in self.preset.params() {
            query.push('&');
            query.push_str(name);
            if let Some(value) = value {
                query.push('=');
                query.push_str(&value);
            }
        }

        url.set_query(Some(&query));
        Ok(url)
    }
}

impl fmt::Display for DownloadRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.redacted())
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
