//! Historical weather from an Open-Meteo-compatible archive endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::{
    error::PipelineError,
    model::{Coordinates, DateRange},
    pipeline::{ApiRequest, RequestPipeline},
    service::Service,
};

pub const DAILY_METRICS: &str = "weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum";
pub const HOURLY_METRICS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m";

/// Daily aggregates; every vector is parallel to `time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    #[serde(default)]
    pub weather_code: Vec<Option<u16>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hourly series; every vector is parallel to `time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoded archive response. Fields we do not read are kept in `extra`, so
/// serializing it back yields the payload as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherArchive {
    pub daily: DailySeries,
    pub hourly: HourlySeries,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    pipeline: Arc<RequestPipeline>,
    base_url: String,
    timezone: String,
}

impl WeatherClient {
    pub fn new(
        pipeline: Arc<RequestPipeline>,
        base_url: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self { pipeline, base_url: base_url.into(), timezone: timezone.into() }
    }

    pub fn request(&self, coordinates: &Coordinates, range: &DateRange) -> ApiRequest {
        ApiRequest::get(Service::Weather, self.base_url.as_str())
            .query("latitude", coordinates.latitude.to_string())
            .query("longitude", coordinates.longitude.to_string())
            .query("start_date", range.start_iso())
            .query("end_date", range.end_iso())
            .query("daily", DAILY_METRICS)
            .query("hourly", HOURLY_METRICS)
            .query("timezone", self.timezone.as_str())
    }

    pub async fn historical(
        &self,
        coordinates: &Coordinates,
        range: &DateRange,
    ) -> Result<WeatherArchive, PipelineError> {
        let archive: WeatherArchive = self.pipeline.execute(&self.request(coordinates, range)).await?;
        tracing::info!(
            days = archive.daily.time.len(),
            hours = archive.hourly.time.len(),
            "weather archive received"
        );
        Ok(archive)
    }
}

/// Short description of a WMO weather interpretation code.
pub fn describe_weather_code(code: u16) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 => "Rain",
        65 => "Heavy rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 | 77 => "Snow",
        80 | 81 => "Rain showers",
        82 => "Violent rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "latitude": 45.06,
            "longitude": 7.68,
            "timezone": "Europe/Rome",
            "daily_units": {"temperature_2m_max": "°C"},
            "daily": {
                "time": ["2024-03-07", "2024-03-08"],
                "weather_code": [3, 61],
                "temperature_2m_max": [12.4, 10.1],
                "temperature_2m_min": [4.0, null],
                "precipitation_sum": [0.0, 7.3]
            },
            "hourly": {
                "time": ["2024-03-07T00:00", "2024-03-07T01:00"],
                "temperature_2m": [5.1, 4.8],
                "relative_humidity_2m": [80.0, 82.0],
                "wind_speed_10m": [3.2, null]
            }
        })
    }

    #[test]
    fn decodes_archive_with_nulls() {
        let archive: WeatherArchive = serde_json::from_value(sample()).expect("valid archive");

        assert_eq!(archive.daily.time.len(), 2);
        assert_eq!(archive.daily.weather_code, vec![Some(3), Some(61)]);
        assert_eq!(archive.daily.temperature_2m_min, vec![Some(4.0), None]);
        assert_eq!(archive.hourly.relative_humidity_2m, vec![Some(80.0), Some(82.0)]);
        assert_eq!(archive.hourly.wind_speed_10m, vec![Some(3.2), None]);
    }

    #[test]
    fn reserializes_the_payload_as_received() {
        let raw = sample();
        let archive: WeatherArchive = serde_json::from_value(raw.clone()).expect("valid archive");

        assert_eq!(serde_json::to_value(&archive).expect("serializable"), raw);
    }

    #[test]
    fn missing_metric_arrays_default_to_empty() {
        let archive: WeatherArchive = serde_json::from_value(json!({
            "daily": {"time": ["2024-03-07"]},
            "hourly": {"time": []}
        }))
        .expect("valid archive");

        assert!(archive.daily.precipitation_sum.is_empty());
        assert!(archive.hourly.temperature_2m.is_empty());
    }

    #[test]
    fn weather_codes() {
        assert_eq!(describe_weather_code(0), "Clear sky");
        assert_eq!(describe_weather_code(63), "Rain");
        assert_eq!(describe_weather_code(99), "Thunderstorm with hail");
        assert_eq!(describe_weather_code(42), "Unknown");
    }
}
