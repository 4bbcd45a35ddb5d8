//! JSON export of a search result.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::{model::Location, weather::WeatherArchive};

const MAX_SLUG_LEN: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct ExportLocation {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub location: ExportLocation,
    pub weather_data: WeatherArchive,
    pub export_date: String,
}

impl ExportDocument {
    pub fn new(location: &Location, weather: &WeatherArchive, exported_at: DateTime<Utc>) -> Self {
        Self {
            location: ExportLocation {
                address: location.address.clone(),
                latitude: location.coordinates.latitude,
                longitude: location.coordinates.longitude,
            },
            weather_data: weather.clone(),
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn file_name(&self) -> String {
        export_file_name(&self.location.address)
    }
}

/// `weather-data-<slug>.json` for the given address.
pub fn export_file_name(address: &str) -> String {
    format!("weather-data-{}.json", slug(address))
}

/// Lowercase, keep `[a-z0-9-]` and whitespace, turn whitespace runs into `-`,
/// cut to 50 characters; `location` when nothing is left.
pub fn slug(address: &str) -> String {
    let kept: String = address
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }

    let truncated: String = out.chars().take(MAX_SLUG_LEN).collect();
    if truncated.is_empty() { "location".to_string() } else { truncated }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;
    use chrono::TimeZone;

    #[test]
    fn slug_rules() {
        assert_eq!(slug("Via Roma, 10, 10121 Torino"), "via-roma-10-10121-torino");
        assert_eq!(slug("  Main   St.  "), "-main-st-");
        assert_eq!(slug("Straße 5"), "strae-5");
        assert_eq!(slug("!!!"), "location");
        assert_eq!(slug(""), "location");
        assert_eq!(slug(&"a".repeat(80)).len(), 50);
    }

    #[test]
    fn file_name_wraps_slug() {
        assert_eq!(export_file_name("Turin"), "weather-data-turin.json");
        assert_eq!(export_file_name("???"), "weather-data-location.json");
    }

    #[test]
    fn document_layout() {
        let location = Location {
            address: "Piazza Castello, Torino".into(),
            coordinates: Coordinates { latitude: 45.07, longitude: 7.69, display_name: None },
        };
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();

        let doc = ExportDocument::new(&location, &WeatherArchive::default(), at);
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["location"]["address"], "Piazza Castello, Torino");
        assert_eq!(value["location"]["latitude"], 45.07);
        assert_eq!(value["exportDate"], "2024-03-15T09:30:00.000Z");
        assert!(value["weatherData"]["daily"]["time"].is_array());
        assert_eq!(doc.file_name(), "weather-data-piazza-castello-torino.json");
        assert!(doc.to_pretty_json().unwrap().contains("\n  \"location\""));
    }
}
