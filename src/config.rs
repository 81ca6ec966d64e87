//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::realtime::{Backoff, ReconnectPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend HTTP configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Realtime channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_ws_path")]
    pub path: String,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// Unlimited when absent
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,

    #[serde(default)]
    pub backoff: BackoffKind,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

/// Backoff strategy as written in the config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

fn default_ws_path() -> String {
    "/ws/realtime".to_string()
}

fn default_reconnect_delay() -> u64 {
    5000 // 5 seconds
}

fn default_max_delay() -> u64 {
    30_000
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            path: default_ws_path(),
            reconnect_delay_ms: default_reconnect_delay(),
            max_reconnect_attempts: None,
            backoff: BackoffKind::default(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RealtimeConfig {
    /// Build the reconnect policy described by this section
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let base = Duration::from_millis(self.reconnect_delay_ms);
        let backoff = match self.backoff {
            BackoffKind::Fixed => Backoff::Fixed(base),
            BackoffKind::Exponential => Backoff::Exponential {
                base,
                max: Duration::from_millis(self.max_delay_ms),
            },
        };

        ReconnectPolicy {
            backoff,
            max_attempts: self.max_reconnect_attempts,
        }
    }
}

/// Dashboard view configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_metrics_refresh")]
    pub metrics_refresh_secs: u64,

    #[serde(default = "default_notification_duration")]
    pub notification_duration_ms: u64,

    #[serde(default = "default_chart_window")]
    pub chart_window: usize,
}

fn default_metrics_refresh() -> u64 {
    30
}

fn default_notification_duration() -> u64 {
    5000
}

fn default_chart_window() -> usize {
    20
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            metrics_refresh_secs: default_metrics_refresh(),
            notification_duration_ms: default_notification_duration(),
            chart_window: default_chart_window(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or spin the client
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("api.request_timeout_secs", self.api.request_timeout_secs),
            ("realtime.reconnect_delay_ms", self.realtime.reconnect_delay_ms),
            ("realtime.max_delay_ms", self.realtime.max_delay_ms),
            ("dashboard.metrics_refresh_secs", self.dashboard.metrics_refresh_secs),
            ("dashboard.notification_duration_ms", self.dashboard.notification_duration_ms),
            ("dashboard.chart_window", self.dashboard.chart_window as u64),
        ];

        for (field, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.realtime.backoff == BackoffKind::Exponential
            && self.realtime.max_delay_ms < self.realtime.reconnect_delay_ms
        {
            return Err(ConfigError::Invalid {
                field: "realtime.max_delay_ms",
                reason: "must not be below reconnect_delay_ms".to_string(),
            });
        }

        Ok(())
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("dazno").join("config.toml")),
            Some(PathBuf::from("/etc/dazno/config.toml")),
            Some(PathBuf::from("./dazno.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// WebSocket URL of the realtime endpoint, scheme matching the API base
    pub fn realtime_url(&self) -> String {
        let base = self.api.base_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}{}", base, self.realtime.path)
    }

    /// Apply environment variable overrides to an existing config
    ///
    /// Unparseable values and zero durations are ignored.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DAZNO_API_URL") {
            self.api.base_url = url;
        }
        if let Some(t) = positive_env("DAZNO_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = t;
        }

        if let Some(d) = positive_env("DAZNO_RECONNECT_DELAY_MS") {
            self.realtime.reconnect_delay_ms = d;
        }
        if let Ok(attempts) = std::env::var("DAZNO_MAX_RECONNECT_ATTEMPTS") {
            if let Ok(a) = attempts.parse() {
                self.realtime.max_reconnect_attempts = Some(a);
            }
        }

        if let Ok(level) = std::env::var("DAZNO_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DAZNO_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

fn positive_env(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!(variable = name, value = %raw, "Ignoring invalid environment override");
            None
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Dazno Dashboard Configuration
#
# Environment variables override these settings:
# - DAZNO_API_URL
# - DAZNO_REQUEST_TIMEOUT_SECS
# - DAZNO_RECONNECT_DELAY_MS
# - DAZNO_MAX_RECONNECT_ATTEMPTS
# - DAZNO_LOG_LEVEL
# - DAZNO_LOG_FORMAT

[api]
# Backend base URL (the realtime URL is derived from it)
base_url = "http://localhost:3000"

# Request timeout in seconds
request_timeout_secs = 30

[realtime]
# WebSocket endpoint path
path = "/ws/realtime"

# Delay before reopening a lost connection (ms)
reconnect_delay_ms = 5000

# Backoff strategy: fixed or exponential
backoff = "fixed"

# Upper bound for exponential backoff (ms)
max_delay_ms = 30000

# Give up after this many consecutive failed attempts (unlimited if unset)
# max_reconnect_attempts = 10

[dashboard]
# How often metric cards are refreshed (seconds)
metrics_refresh_secs = 30

# How long a notification stays visible (ms)
notification_duration_ms = 5000

# Number of points kept in the performance chart
chart_window = 20

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
