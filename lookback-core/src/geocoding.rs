//! Address → coordinates through a Nominatim-compatible search endpoint.

use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use crate::{
    error::PipelineError,
    model::Coordinates,
    pipeline::{ApiRequest, RequestPipeline},
    service::Service,
};

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    pipeline: Arc<RequestPipeline>,
    base_url: String,
}

/// One entry of the search response. Nominatim sends coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    #[serde(deserialize_with = "number_from_str")]
    lat: f64,
    #[serde(deserialize_with = "number_from_str")]
    lon: f64,
    display_name: Option<String>,
}

fn number_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        Raw::Number(n) => Ok(n),
    }
}

impl GeocodingClient {
    pub fn new(pipeline: Arc<RequestPipeline>, base_url: impl Into<String>) -> Self {
        Self { pipeline, base_url: base_url.into() }
    }

    pub fn request(&self, address: &str) -> ApiRequest {
        ApiRequest::get(Service::Geocoding, self.base_url.as_str())
            .query("q", address)
            .query("format", "json")
            .query("limit", "1")
    }

    /// Best match for `address`, or `None` when the service knows no such place.
    pub async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, PipelineError> {
        let places: Vec<Place> = self.pipeline.execute(&self.request(address)).await?;

        let coordinates = places.into_iter().next().map(|place| Coordinates {
            latitude: place.lat,
            longitude: place.lon,
            display_name: place.display_name,
        });

        match &coordinates {
            Some(c) => tracing::info!(latitude = c.latitude, longitude = c.longitude, "address resolved"),
            None => tracing::info!(address, "no match for address"),
        }

        Ok(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_string_coordinates() {
        let places: Vec<Place> = serde_json::from_str(
            r#"[{"lat":"45.07","lon":"7.69","display_name":"Turin","place_id":1}]"#,
        )
        .expect("valid payload");

        assert_eq!(places[0].lat, 45.07);
        assert_eq!(places[0].lon, 7.69);
        assert_eq!(places[0].display_name.as_deref(), Some("Turin"));
    }

    #[test]
    fn accepts_numeric_coordinates() {
        let places: Vec<Place> =
            serde_json::from_str(r#"[{"lat":1.5,"lon":-2.25}]"#).expect("valid payload");

        assert_eq!(places[0].lat, 1.5);
        assert_eq!(places[0].lon, -2.25);
        assert_eq!(places[0].display_name, None);
    }

    #[test]
    fn rejects_garbage_coordinates() {
        let result: Result<Vec<Place>, _> =
            serde_json::from_str(r#"[{"lat":"north","lon":"7.69"}]"#);
        assert!(result.is_err());
    }
}
