//! Uniform wrapper around every outbound HTTP call.
//!
//! A call through [`RequestPipeline::execute`]:
//! - counts as in flight on the [`LoadingTracker`] until it settles,
//! - is retried with linear backoff while failures are transient,
//! - on final failure posts a user-facing error to the [`NotificationQueue`]
//!   and returns a [`PipelineError`] carrying the same message.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{
    Config,
    error::{ErrorClass, FetchError, PipelineError},
    loading::LoadingTracker,
    notification::NotificationQueue,
    service::Service,
};

/// What to send: method, URL, query parameters, and which service it targets.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub service: Service,
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(service: Service, url: impl Into<String>) -> Self {
        Self { service, method: Method::GET, url: url.into(), query: Vec::new() }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// A response as received, before any status check.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Sends one attempt. `Err` only when no response was received.
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().user_agent(user_agent).timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, FetchError> {
        let res = self
            .http
            .request(request.method.clone(), &request.url)
            .query(&request.query)
            .send()
            .await
            .map_err(describe)?;

        let status = res.status();
        let body = res.text().await.map_err(describe)?;

        Ok(RawResponse { status, body })
    }
}

fn describe(err: reqwest::Error) -> FetchError {
    let builder = err.is_builder();
    // `{:#}` walks the source chain, e.g. "... : Connection refused".
    let description = format!("{:#}", anyhow::Error::from(err));
    if builder { FetchError::InvalidRequest(description) } else { FetchError::Transport(description) }
}

/// Retry schedule: up to `max_retries` extra attempts, retry `n` waits `n * delay_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, delay_step: Duration::from_millis(1000) }
    }
}

/// One retry decision, logged and then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    pub attempt: u32,
    pub class: ErrorClass,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.retry.max_retries,
            delay_step: Duration::from_millis(config.retry.delay_step_ms),
        }
    }

    pub fn classify(&self, error: &FetchError) -> ErrorClass {
        match error {
            FetchError::Transport(_) => ErrorClass::Transient,
            FetchError::Status { status, .. } if status.is_server_error() => ErrorClass::Transient,
            FetchError::Status { .. } | FetchError::Decode { .. } | FetchError::InvalidRequest(_) => {
                ErrorClass::ClientError
            }
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.delay_step * retry
    }

    /// Decides what happens after `attempt` (1-based) failed with `error`.
    /// `None` means give up.
    pub fn next_retry(&self, attempt: u32, error: &FetchError) -> Option<RetryAttempt> {
        let class = self.classify(error);
        if class != ErrorClass::Transient || attempt > self.max_retries {
            return None;
        }
        Some(RetryAttempt { attempt: attempt + 1, class, delay: self.delay_for(attempt) })
    }
}

/// Message shown to the user when a call finally fails.
pub fn user_message(service: Service, error: &FetchError) -> String {
    match service {
        Service::Geocoding => format!("Error during address lookup ({})", detail(error)),
        Service::Weather => format!("Error retrieving weather data ({})", detail(error)),
        Service::Other => match error {
            FetchError::Transport(_) | FetchError::InvalidRequest(_) => detail(error),
            FetchError::Status { status, .. } => format!(
                "Error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            ),
            FetchError::Decode { status, source } => {
                format!("Error {}: invalid response body: {source}", status.as_u16())
            }
        },
    }
}

fn detail(error: &FetchError) -> String {
    match error {
        FetchError::Transport(desc) | FetchError::InvalidRequest(desc) => {
            format!("Connection error: {desc}")
        }
        FetchError::Status { status, .. } => format!("HTTP {status}"),
        FetchError::Decode { .. } => error.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    loading: Arc<LoadingTracker>,
    notifications: Arc<NotificationQueue>,
    retry: RetryPolicy,
}

impl RequestPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        loading: Arc<LoadingTracker>,
        notifications: Arc<NotificationQueue>,
        retry: RetryPolicy,
    ) -> Self {
        Self { transport, loading, notifications, retry }
    }

    /// Pipeline over a real HTTP client configured from `config`.
    pub fn from_config(
        config: &Config,
        loading: Arc<LoadingTracker>,
        notifications: Arc<NotificationQueue>,
    ) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.http.user_agent, config.http.timeout())?;
        Ok(Self::new(Arc::new(transport), loading, notifications, RetryPolicy::from_config(config)))
    }

    pub fn loading(&self) -> &Arc<LoadingTracker> {
        &self.loading
    }

    pub fn notifications(&self) -> &Arc<NotificationQueue> {
        &self.notifications
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Sends `request` and decodes a successful body as JSON into `T`.
    #[tracing::instrument(skip_all, fields(service = ?request.service, url = %request.url))]
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, PipelineError> {
        let _loading = self.loading.track();
        let mut attempt = 1;

        loop {
            let error = match self.attempt::<T>(request).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            match self.retry.next_retry(attempt, &error) {
                Some(retry) => {
                    tracing::info!(
                        attempt = retry.attempt,
                        class = ?retry.class,
                        delay_ms = retry.delay.as_millis() as u64,
                        error = %error,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(retry.delay).await;
                    attempt = retry.attempt;
                }
                None => return Err(self.fail(request, error, attempt)),
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, FetchError> {
        let res = self.transport.send(request).await?;

        if !res.status.is_success() {
            return Err(FetchError::Status { status: res.status, body: truncate_body(&res.body) });
        }

        serde_json::from_str(&res.body)
            .map_err(|source| FetchError::Decode { status: res.status, source })
    }

    fn fail(&self, request: &ApiRequest, error: FetchError, attempts: u32) -> PipelineError {
        let class = self.retry.classify(&error);
        let message = user_message(request.service, &error);

        tracing::warn!(attempts, class = ?class, error = %error, "request failed");
        self.notifications.error(message.clone(), None);

        PipelineError { message, class, attempts, source: error }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
