use std::{convert::TryFrom, fmt};

pub const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_WEATHER_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// A configurable external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    Geocoding,
    Weather,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::Geocoding => "geocoding",
            ServiceId::Weather => "weather",
        }
    }

    pub const fn all() -> &'static [ServiceId] {
        &[ServiceId::Geocoding, ServiceId::Weather]
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            ServiceId::Geocoding => DEFAULT_GEOCODING_URL,
            ServiceId::Weather => DEFAULT_WEATHER_URL,
        }
    }

    /// Environment variable that overrides the configured base URL.
    pub fn env_var(&self) -> &'static str {
        match self {
            ServiceId::Geocoding => "LOOKBACK_GEOCODING_URL",
            ServiceId::Weather => "LOOKBACK_WEATHER_URL",
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<&str> for ServiceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "geocoding" => Ok(ServiceId::Geocoding),
            "weather" => Ok(ServiceId::Weather),
            _ => Err(anyhow::anyhow!(
                "Unknown service '{value}'. Supported services: geocoding, weather."
            )),
        }
    }
}

/// Which endpoint a pipeline request targets; selects the user-facing error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Geocoding,
    Weather,
    Other,
}

impl From<ServiceId> for Service {
    fn from(id: ServiceId) -> Self {
        match id {
            ServiceId::Geocoding => Service::Geocoding,
            ServiceId::Weather => Service::Weather,
        }
    }
}
