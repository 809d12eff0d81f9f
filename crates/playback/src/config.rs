//! Configuration for playback sessions and frame fetching.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Public MeteoSwiss product endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.meteoswiss.admin.ch/product/output";

/// Configuration for a playback session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Autoplay period in milliseconds.
    pub tick_interval_ms: u64,

    /// Trailing-edge throttle window for scrub dispatches in milliseconds.
    pub scrub_throttle_ms: u64,

    /// Upper bound on one fetch, including retries, in seconds.
    pub fetch_timeout_secs: u64,

    /// Upper bound on a single attempt in seconds. Capped at
    /// `fetch_timeout_secs`.
    pub request_timeout_secs: u64,

    /// Retries after the first failed attempt. 0 disables retrying.
    pub max_retries: u32,

    /// First retry delay in milliseconds; doubles per attempt.
    pub initial_retry_delay_ms: u64,

    /// Cap on the retry delay in milliseconds.
    pub max_retry_delay_ms: u64,

    /// Maximum number of decoded frames kept in memory.
    pub cache_capacity: usize,

    /// Capacity of the event channel handed to the consumer.
    pub event_buffer: usize,

    /// Base URL that relative frame references are resolved against.
    pub base_url: String,

    /// strftime pattern for frame labels.
    pub label_format: String,

    /// Label timezone as minutes east of UTC.
    pub utc_offset_minutes: i32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            scrub_throttle_ms: 250,
            fetch_timeout_secs: 30,
            request_timeout_secs: 8,
            max_retries: 2,
            initial_retry_delay_ms: 500,
            max_retry_delay_ms: 5000,
            cache_capacity: 64,
            event_buffer: 256,
            base_url: DEFAULT_BASE_URL.to_string(),
            label_format: radar_common::time::DEFAULT_LABEL_FORMAT.to_string(),
            utc_offset_minutes: 0,
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse("RADAR_TICK_INTERVAL_MS") {
            config.tick_interval_ms = val;
        }

        if let Some(val) = env_parse("RADAR_SCRUB_THROTTLE_MS") {
            config.scrub_throttle_ms = val;
        }

        if let Some(val) = env_parse("RADAR_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout_secs = val;
        }

        if let Some(val) = env_parse("RADAR_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = val;
        }

        if let Some(val) = env_parse("RADAR_MAX_RETRIES") {
            config.max_retries = val;
        }

        if let Some(val) = env_parse("RADAR_INITIAL_RETRY_DELAY_MS") {
            config.initial_retry_delay_ms = val;
        }

        if let Some(val) = env_parse("RADAR_MAX_RETRY_DELAY_MS") {
            config.max_retry_delay_ms = val;
        }

        if let Some(val) = env_parse("RADAR_CACHE_CAPACITY") {
            config.cache_capacity = val;
        }

        if let Some(val) = env_parse("RADAR_EVENT_BUFFER") {
            config.event_buffer = val;
        }

        if let Ok(val) = std::env::var("RADAR_BASE_URL") {
            config.base_url = val;
        }

        if let Ok(val) = std::env::var("RADAR_LABEL_FORMAT") {
            config.label_format = val;
        }

        if let Some(val) = env_parse("RADAR_UTC_OFFSET_MINUTES") {
            config.utc_offset_minutes = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be > 0".to_string());
        }

        if self.scrub_throttle_ms == 0 {
            return Err("scrub_throttle_ms must be > 0".to_string());
        }

        if self.fetch_timeout_secs == 0 {
            return Err("fetch_timeout_secs must be > 0".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }

        if self.initial_retry_delay_ms > self.max_retry_delay_ms {
            return Err("initial_retry_delay_ms must not exceed max_retry_delay_ms".to_string());
        }

        if self.cache_capacity == 0 {
            return Err("cache_capacity must be > 0".to_string());
        }

        if self.event_buffer == 0 {
            return Err("event_buffer must be > 0".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("base_url must be an http(s) URL, got '{}'", self.base_url));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn scrub_throttle(&self) -> Duration {
        Duration::from_millis(self.scrub_throttle_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.min(self.fetch_timeout_secs))
    }

    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
