//! Geocoding provider backed by the Nominatim search API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use grenzli_core::{
    model::{GeocodeResult, OsmId},
    ports::{GeocodePort, PortError},
};

/// Public OpenStreetMap Nominatim instance.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Geocoder that asks Nominatim for the best match of a place name.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Create a geocoder against the public instance.
    ///
    /// Nominatim rejects requests without a user agent, so the client should
    /// carry one.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Create a geocoder against a self-hosted instance.
    #[must_use]
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl GeocodePort for NominatimGeocoder {
    async fn resolve(&self, query: &str) -> Result<Option<GeocodeResult>, PortError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let body = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let result = first_hit(&body)?;
        if result.is_none() {
            log::debug!("nominatim has no usable match for {query:?}");
        }
        Ok(result)
    }
}

/// Pick the first search hit that carries an `osm_id`.
///
/// # Errors
///
/// Returns [`PortError::Decode`] when the body is not a JSON array of objects.
pub fn first_hit(body: &str) -> Result<Option<GeocodeResult>, PortError> {
    let hits: Vec<Map<String, Value>> = serde_json::from_str(body)?;
    Ok(hits.into_iter().next().and_then(from_raw))
}

fn from_raw(raw: Map<String, Value>) -> Option<GeocodeResult> {
    let osm_id = match raw.get("osm_id")? {
        Value::Number(number) => number.as_u64()?,
        // some instances serialise ids as strings
        Value::String(text) => text.parse().ok()?,
        _ => return None,
    };
    let display_name = raw
        .get("display_name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let osm_type = raw.get("osm_type").and_then(Value::as_str).map(str::to_owned);

    Some(GeocodeResult {
        display_name,
        osm_id: OsmId(osm_id),
        osm_type,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_hit_extracts_identifier() {
        let body = r#"[
            {"place_id": 1, "osm_type": "relation", "osm_id": 51477,
             "display_name": "Deutschland", "class": "boundary"},
            {"place_id": 2, "osm_type": "node", "osm_id": 9, "display_name": "Other"}
        ]"#;

        let hit = first_hit(body).unwrap().unwrap();
        assert_eq!(hit.osm_id, OsmId(51477));
        assert_eq!(hit.display_name, "Deutschland");
        assert_eq!(hit.osm_type.as_deref(), Some("relation"));
        assert_eq!(hit.raw.get("class"), Some(&Value::from("boundary")));
    }

    #[test]
    fn string_ids_are_accepted() {
        let hit = first_hit(r#"[{"osm_id": "12345", "display_name": "Wakanda"}]"#)
            .unwrap()
            .unwrap();
        assert_eq!(hit.osm_id, OsmId(12345));
        assert_eq!(hit.osm_type, None);
    }

    #[test]
    fn empty_result_is_not_found() {
        assert!(first_hit("[]").unwrap().is_none());
    }

    #[test]
    fn hit_without_identifier_is_not_found() {
        assert!(first_hit(r#"[{"display_name": "Atlantis"}]"#).unwrap().is_none());
        assert!(first_hit(r#"[{"osm_id": -3}]"#).unwrap().is_none());
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(matches!(
            first_hit(r#"{"error": "rate limited"}"#),
            Err(PortError::Decode(_))
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let geocoder = NominatimGeocoder::with_base_url(Client::new(), "http://localhost:8080/");
        assert_eq!(geocoder.base_url, "http://localhost:8080");
    }
}
