use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::PathBuf, time::Duration};

use crate::service::ServiceId;

pub const DEFAULT_TIMEZONE: &str = "Europe/Rome";
pub const DEFAULT_USER_AGENT: &str = concat!("lookback/", env!("CARGO_PKG_VERSION"));

/// Configuration for a single external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before retry `n` is `n * delay_step_ms`.
    pub delay_step_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 2, delay_step_ms: 1000 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub default_duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { default_duration_ms: 5000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { user_agent: DEFAULT_USER_AGENT.to_string(), timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Example TOML:
    /// [services.geocoding]
    /// base_url = "https://nominatim.openstreetmap.org/search"
    pub services: HashMap<String, ServiceConfig>,

    /// Timezone the weather service reports its series in.
    pub timezone: String,

    pub retry: RetryConfig,
    pub notifications: NotificationConfig,
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            services: HashMap::new(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            retry: RetryConfig::default(),
            notifications: NotificationConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "lookback", "lookback")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace the base URL of a service.
    pub fn upsert_service_url(&mut self, id: ServiceId, base_url: String) {
        self.services.insert(id.as_str().to_string(), ServiceConfig { base_url });
    }

    /// Configured base URL, without the environment override.
    pub fn configured_url(&self, id: ServiceId) -> Option<&str> {
        self.services.get(id.as_str()).map(|cfg| cfg.base_url.as_str())
    }

    /// Effective base URL: environment override, then config file, then built-in default.
    pub fn service_url(&self, id: ServiceId) -> String {
        self.resolve_url(id, env::var(id.env_var()).ok())
    }

    fn resolve_url(&self, id: ServiceId, from_env: Option<String>) -> String {
        match from_env {
            Some(url) if !url.trim().is_empty() => url,
            _ => self.configured_url(id).unwrap_or(id.default_url()).to_string(),
        }
    }

    pub fn default_notification_duration(&self) -> Duration {
        Duration::from_millis(self.notifications.default_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{DEFAULT_GEOCODING_URL, DEFAULT_WEATHER_URL};

    #[test]
    fn defaults_match_the_public_services() {
        let cfg = Config::default();

        assert_eq!(cfg.configured_url(ServiceId::Geocoding), None);
        assert_eq!(cfg.timezone, "Europe/Rome");
        assert_eq!(cfg.retry.max_retries, 2);
        assert_eq!(cfg.retry.delay_step_ms, 1000);
        assert_eq!(cfg.default_notification_duration(), Duration::from_millis(5000));
    }

    #[test]
    fn upsert_overrides_service_url() {
        let mut cfg = Config::default();

        cfg.upsert_service_url(ServiceId::Weather, "http://localhost:8080/archive".into());

        assert_eq!(cfg.configured_url(ServiceId::Weather), Some("http://localhost:8080/archive"));
        assert_eq!(cfg.configured_url(ServiceId::Geocoding), None);
    }

    #[test]
    fn url_resolution_prefers_env_then_file_then_default() {
        let mut cfg = Config::default();
        let id = ServiceId::Geocoding;

        assert_eq!(cfg.resolve_url(id, None), DEFAULT_GEOCODING_URL);

        cfg.upsert_service_url(id, "http://localhost:9000/search".into());
        assert_eq!(cfg.resolve_url(id, None), "http://localhost:9000/search");
        assert_eq!(cfg.resolve_url(id, Some("  ".into())), "http://localhost:9000/search");

        assert_eq!(
            cfg.resolve_url(id, Some("http://env.test/search".into())),
            "http://env.test/search"
        );
    }

    #[test]
    fn weather_env_var_is_read() {
        // Only this test touches the variable.
        let cfg = Config::default();
        unsafe { env::set_var(ServiceId::Weather.env_var(), "http://env.test/archive") };
        let url = cfg.service_url(ServiceId::Weather);
        unsafe { env::remove_var(ServiceId::Weather.env_var()) };

        assert_eq!(url, "http://env.test/archive");
        assert_eq!(cfg.service_url(ServiceId::Weather), DEFAULT_WEATHER_URL);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            timezone = "UTC"

            [retry]
            max_retries = 5

            [services.geocoding]
            base_url = "http://geo.local/search"
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(cfg.timezone, "UTC");
        assert_eq!(cfg.retry.max_retries, 5);
        assert_eq!(cfg.retry.delay_step_ms, 1000);
        assert_eq!(cfg.notifications.default_duration_ms, 5000);
        assert_eq!(cfg.configured_url(ServiceId::Geocoding), Some("http://geo.local/search"));
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join("lookback-missing-config-for-test.toml");
        let cfg = Config::load_from(&path).expect("missing file is not an error");
        assert_eq!(cfg.timezone, DEFAULT_TIMEZONE);
    }
}
