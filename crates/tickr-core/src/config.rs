//! Runtime configuration: upstream endpoints, polling cadence, timeouts.
//!
//! Defaults work out of the box. `TICKR_*` environment variables or a JSON
//! document override them, and [`TickrConfig::validate`] enforces the
//! polling floor that protects the upstream quote service.

use std::time::Duration;

use serde::Deserialize;

use crate::ConfigError;

/// Refreshes may never be scheduled closer together than this.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

pub const DEFAULT_QUOTE_ENDPOINT: &str = "https://query.yahooapis.com/v1/public/yql";
pub const DEFAULT_QUOTE_ENV: &str = "http://datatables.org/alltables.env";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://chstocksearch.herokuapp.com/api/";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TickrConfig {
    pub quote_endpoint: String,
    pub quote_env: String,
    pub search_endpoint: String,
    pub refresh_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub event_capacity: usize,
}

impl Default for TickrConfig {
    fn default() -> Self {
        Self {
            quote_endpoint: String::from(DEFAULT_QUOTE_ENDPOINT),
            quote_env: String::from(DEFAULT_QUOTE_ENV),
            search_endpoint: String::from(DEFAULT_SEARCH_ENDPOINT),
            refresh_interval_ms: 5_000,
            request_timeout_ms: 10_000,
            event_capacity: 64,
        }
    }
}

impl TickrConfig {
    /// Defaults overlaid with any `TICKR_*` variables present in the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("TICKR_QUOTE_ENDPOINT") {
            config.quote_endpoint = value;
        }
        if let Some(value) = lookup("TICKR_QUOTE_ENV") {
            config.quote_env = value;
        }
        if let Some(value) = lookup("TICKR_SEARCH_ENDPOINT") {
            config.search_endpoint = value;
        }
        if let Some(value) = lookup("TICKR_REFRESH_INTERVAL_MS") {
            config.refresh_interval_ms = parse_env("TICKR_REFRESH_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("TICKR_REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = parse_env("TICKR_REQUEST_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("TICKR_EVENT_CAPACITY") {
            config.event_capacity = parse_env("TICKR_EVENT_CAPACITY", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_ms = MIN_REFRESH_INTERVAL.as_millis() as u64;
        if self.refresh_interval_ms < min_ms {
            return Err(ConfigError::IntervalTooShort {
                actual_ms: self.refresh_interval_ms,
                min_ms,
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        if self.quote_endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint {
                name: "quote_endpoint",
            });
        }
        if self.search_endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint {
                name: "search_endpoint",
            });
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_owned(),
    })
}
