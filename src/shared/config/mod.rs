//! Application configuration module
//!
//! Provides configuration types for the streaming server. Values are usually
//! loaded by `backend::server::config::load_config`, which layers a TOML file
//! and environment overrides over these defaults.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Per-user token bucket settings for producers
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum burst of producer requests
    pub capacity: u32,
    /// Tokens restored per minute
    pub refill_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            refill_per_minute: 20,
        }
    }
}

/// A resource known to the in-memory resolver
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResourceSeed {
    /// Canonical resource id
    pub id: String,
    /// Human reference, e.g. `meeting-notes`
    pub slug: Option<String>,
    /// Owning user
    pub owner: Uuid,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,
    pub heartbeat_interval_secs: u64,
    /// Frames buffered per connection before the listener counts as failed
    pub sink_buffer: usize,
    /// Close a listener's stream once an `end` event has been written
    pub close_on_end: bool,
    pub stale_after_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_events_per_request: usize,
    pub rate_limit: RateLimitConfig,
    pub resources: Vec<ResourceSeed>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            jwt_secret: "change-me-in-production".to_string(),
            heartbeat_interval_secs: 30,
            sink_buffer: 256,
            close_on_end: true,
            stale_after_secs: 300,
            sweep_interval_secs: 60,
            max_events_per_request: 64,
            rate_limit: RateLimitConfig::default(),
            resources: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("jwt_secret"));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("heartbeat_interval_secs must be > 0"));
        }
        if self.sink_buffer == 0 {
            return Err(ConfigError::InvalidValue("sink_buffer must be > 0"));
        }
        if self.sweep_interval_secs == 0 || self.stale_after_secs == 0 {
            return Err(ConfigError::InvalidValue("stale sweep intervals must be > 0"));
        }
        // Heartbeats are the only activity of a quiet viewer.
        if self.heartbeat_interval_secs >= self.stale_after_secs {
            return Err(ConfigError::InvalidValue(
                "heartbeat_interval_secs must be < stale_after_secs",
            ));
        }
        if self.max_events_per_request == 0 {
            return Err(ConfigError::InvalidValue("max_events_per_request must be > 0"));
        }
        if self.rate_limit.capacity == 0 || self.rate_limit.refill_per_minute == 0 {
            return Err(ConfigError::InvalidValue("rate_limit values must be > 0"));
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn heartbeat_interval_secs(mut self, secs: u64) -> Self {
        self.config.heartbeat_interval_secs = secs;
        self
    }

    pub fn sink_buffer(mut self, frames: usize) -> Self {
        self.config.sink_buffer = frames;
        self
    }

    pub fn close_on_end(mut self, close: bool) -> Self {
        self.config.close_on_end = close;
        self
    }

    pub fn rate_limit(mut self, capacity: u32, refill_per_minute: u32) -> Self {
        self.config.rate_limit = RateLimitConfig {
            capacity,
            refill_per_minute,
        };
        self
    }

    pub fn max_events_per_request(mut self, max: usize) -> Self {
        self.config.max_events_per_request = max;
        self
    }

    /// Register a resource with the in-memory resolver
    pub fn resource(mut self, id: impl Into<String>, slug: Option<&str>, owner: Uuid) -> Self {
        self.config.resources.push(ResourceSeed {
            id: id.into(),
            slug: slug.map(str::to_string),
            owner,
        });
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
}
