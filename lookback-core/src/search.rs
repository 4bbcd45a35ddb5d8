use chrono::Utc;
use std::sync::Arc;

use crate::{
    Config,
    error::SearchError,
    export::ExportDocument,
    geocoding::GeocodingClient,
    loading::LoadingTracker,
    model::{DateRange, Location},
    notification::NotificationQueue,
    pipeline::RequestPipeline,
    service::ServiceId,
    weather::{WeatherArchive, WeatherClient},
};

pub const ADDRESS_NOT_FOUND: &str = "Address not found. Please check the entered data";

/// The address fields the user fills in; all of them are required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressForm {
    pub street: String,
    pub number: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

impl AddressForm {
    fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("street", self.street.as_str()),
            ("number", self.number.as_str()),
            ("postal code", self.postal_code.as_str()),
            ("city", self.city.as_str()),
            ("country", self.country.as_str()),
        ]
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        match self.fields().into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(SearchError::MissingField(name)),
            None => Ok(()),
        }
    }

    /// Non-empty fields joined with ", ".
    pub fn full_address(&self) -> String {
        self.fields()
            .into_iter()
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub location: Location,
    pub range: DateRange,
    pub weather: WeatherArchive,
}

/// Page-level flow: geocode, then fetch the week of weather, and remember the
/// result so it can be retried or exported.
#[derive(Debug)]
pub struct SearchSession {
    geocoding: GeocodingClient,
    weather: WeatherClient,
    notifications: Arc<NotificationQueue>,
    location: Option<Location>,
    last_weather: Option<WeatherArchive>,
}

impl SearchSession {
    pub fn new(
        geocoding: GeocodingClient,
        weather: WeatherClient,
        notifications: Arc<NotificationQueue>,
    ) -> Self {
        Self { geocoding, weather, notifications, location: None, last_weather: None }
    }

    /// Wires both clients over one pipeline built from `config`.
    pub fn from_config(
        config: &Config,
        loading: Arc<LoadingTracker>,
        notifications: Arc<NotificationQueue>,
    ) -> anyhow::Result<Self> {
        let pipeline = Arc::new(RequestPipeline::from_config(config, loading, notifications.clone())?);
        Ok(Self::from_pipeline(config, pipeline))
    }

    pub fn from_pipeline(config: &Config, pipeline: Arc<RequestPipeline>) -> Self {
        let notifications = pipeline.notifications().clone();
        let geocoding = GeocodingClient::new(pipeline.clone(), config.service_url(ServiceId::Geocoding));
        let weather = WeatherClient::new(pipeline, config.service_url(ServiceId::Weather), config.timezone.clone());
        Self::new(geocoding, weather, notifications)
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn weather(&self) -> Option<&WeatherArchive> {
        self.last_weather.as_ref()
    }

    pub async fn search(&mut self, form: &AddressForm) -> Result<SearchOutcome, SearchError> {
        form.validate()?;
        let address = form.full_address();

        let coordinates = match self.geocoding.lookup(&address).await {
            Ok(Some(coordinates)) => coordinates,
            Ok(None) => {
                self.notifications.error(ADDRESS_NOT_FOUND, None);
                return Err(SearchError::NotFound(address));
            }
            Err(err) => {
                self.notifications.error(format!("Error: {err}. Try again later"), None);
                return Err(err.into());
            }
        };

        let location = Location { address, coordinates };
        self.location = Some(location.clone());
        self.fetch_weather(location, DateRange::last_week()).await
    }

    /// Refetches the weather for the last found location with a fresh date range.
    /// `None` when nothing has been found yet.
    pub async fn retry(&mut self) -> Option<Result<SearchOutcome, SearchError>> {
        let location = self.location.clone()?;
        Some(self.fetch_weather(location, DateRange::last_week()).await)
    }

    async fn fetch_weather(
        &mut self,
        location: Location,
        range: DateRange,
    ) -> Result<SearchOutcome, SearchError> {
        self.last_weather = None;

        match self.weather.historical(&location.coordinates, &range).await {
            Ok(weather) => {
                self.last_weather = Some(weather.clone());
                Ok(SearchOutcome { location, range, weather })
            }
            Err(err) => {
                self.notifications.error(format!("Error: {err}. Try again"), None);
                Err(err.into())
            }
        }
    }

    /// Export document for the current result; `None` until weather is loaded.
    pub fn export(&self) -> Option<ExportDocument> {
        let location = self.location.as_ref()?;
        let weather = self.weather()?;
        Some(ExportDocument::new(location, weather, Utc::now()))
    }
}
