//! Core library for the `lookback` CLI.
//!
//! This crate defines:
//! - Configuration (service endpoints, retry schedule, notification defaults)
//! - The request pipeline: loading tracking, retry with linear backoff,
//!   user-facing error notifications
//! - Geocoding and historical weather clients built on that pipeline
//! - The search flow tying them together, plus chart projection and export
//!
//! It is used by `lookback-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod error;
pub mod export;
pub mod geocoding;
pub mod loading;
pub mod model;
pub mod notification;
pub mod pipeline;
pub mod search;
pub mod series;
pub mod service;
pub mod weather;

pub use config::Config;
pub use error::{ErrorClass, FetchError, PipelineError, SearchError};
pub use export::ExportDocument;
pub use geocoding::GeocodingClient;
pub use loading::{LoadingGuard, LoadingTracker};
pub use model::{Coordinates, DateRange, Location};
pub use notification::{Notification, NotificationBoard, NotificationQueue, Severity};
pub use pipeline::{ApiRequest, HttpTransport, RawResponse, RequestPipeline, RetryPolicy, Transport};
pub use search::{AddressForm, SearchOutcome, SearchSession};
pub use service::{Service, ServiceId};
pub use weather::{WeatherArchive, WeatherClient};
