//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/pagebeacon/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/pagebeacon/` (~/.config/pagebeacon/)
//! - Data: `$XDG_DATA_HOME/pagebeacon/` (~/.local/share/pagebeacon/)
//! - State/Logs: `$XDG_STATE_HOME/pagebeacon/` (~/.local/state/pagebeacon/)
//!
//! Every threshold used by the pipeline lives here and is passed in
//! explicitly; nothing downstream reads a hard-coded default.

use crate::error::{Error, Result};
use chrono::Duration;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Upper bound for every duration setting, in seconds (one leap year).
pub const MAX_DURATION_SECS: i64 = 366 * 24 * 60 * 60;

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Alert thresholds
    #[serde(default)]
    pub alerts: AlertThresholds,

    /// Session reconstruction settings
    #[serde(default)]
    pub sessions: SessionConfig,

    /// Aggregation settings
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Batch import settings
    #[serde(default)]
    pub import: ImportConfig,

    /// Beacon delivery settings
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Thresholds for the hour-over-hour alert check, all in percent.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AlertThresholds {
    /// Growth above this fires `traffic_spike`
    #[serde(default = "default_traffic_spike_pct")]
    pub traffic_spike_pct: f64,

    /// Growth below the negation of this fires `traffic_drop`
    #[serde(default = "default_traffic_drop_pct")]
    pub traffic_drop_pct: f64,

    /// Error rate above this fires `high_error_rate`
    #[serde(default = "default_error_rate_pct")]
    pub error_rate_pct: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            traffic_spike_pct: default_traffic_spike_pct(),
            traffic_drop_pct: default_traffic_drop_pct(),
            error_rate_pct: default_error_rate_pct(),
        }
    }
}

fn default_traffic_spike_pct() -> f64 {
    50.0
}

fn default_traffic_drop_pct() -> f64 {
    30.0
}

fn default_error_rate_pct() -> f64 {
    5.0
}

/// Session settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SessionConfig {
    /// Sessions shorter than this with a single page are bounces
    #[serde(default = "default_bounce_threshold_secs")]
    pub bounce_threshold_secs: i64,

    /// Minutes of inactivity after which an emitter starts a new session
    #[serde(default = "default_inactivity_minutes")]
    pub inactivity_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bounce_threshold_secs: default_bounce_threshold_secs(),
            inactivity_minutes: default_inactivity_minutes(),
        }
    }
}

impl SessionConfig {
    pub fn bounce_threshold(&self) -> Duration {
        Duration::seconds(self.bounce_threshold_secs.clamp(0, MAX_DURATION_SECS))
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::minutes(self.inactivity_minutes.clamp(0, MAX_DURATION_SECS / 60))
    }
}

fn default_bounce_threshold_secs() -> i64 {
    30
}

fn default_inactivity_minutes() -> i64 {
    30
}

/// Aggregation settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AggregationConfig {
    /// Histogram bucket width in milliseconds
    #[serde(default = "default_histogram_bucket_width_ms")]
    pub histogram_bucket_width_ms: f64,

    /// Size of each comparison window in seconds
    #[serde(default = "default_comparison_window_secs")]
    pub comparison_window_secs: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            histogram_bucket_width_ms: default_histogram_bucket_width_ms(),
            comparison_window_secs: default_comparison_window_secs(),
        }
    }
}

impl AggregationConfig {
    pub fn comparison_window(&self) -> Duration {
        Duration::seconds(self.comparison_window_secs.clamp(0, MAX_DURATION_SECS))
    }
}

fn default_histogram_bucket_width_ms() -> f64 {
    100.0
}

fn default_comparison_window_secs() -> i64 {
    3600
}

/// Batch import settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ImportConfig {
    /// Maximum number of per-line errors kept in an import report
    #[serde(default = "default_max_error_details")]
    pub max_error_details: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_error_details: default_max_error_details(),
        }
    }
}

fn default_max_error_details() -> usize {
    10
}

/// Beacon delivery configuration
///
/// Used by emitters that push beacons to the collection endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct DeliveryConfig {
    /// Enable/disable beacon delivery
    #[serde(default)]
    pub enabled: bool,

    /// Collection endpoint URL (e.g., `https://example.com/log_endpoint`)
    pub endpoint: Option<String>,

    /// Application id stamped on every beacon
    #[serde(default = "default_app_id")]
    pub app_id: String,

    /// Deadline for a single delivery in seconds
    #[serde(default = "default_delivery_timeout")]
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            app_id: default_app_id(),
            timeout_secs: default_delivery_timeout(),
        }
    }
}

impl DeliveryConfig {
    /// Check if delivery is enabled and has somewhere to send to
    pub fn is_ready(&self) -> bool {
        self.enabled && self.endpoint.is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.endpoint.is_none() {
            return Err(Error::Config(
                "delivery.endpoint is required when delivery is enabled".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "delivery.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_app_id() -> String {
    "default-app-id".to_string()
}

fn default_delivery_timeout() -> u64 {
    5
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.aggregation.histogram_bucket_width_ms <= 0.0 {
            return Err(Error::Config(
                "aggregation.histogram_bucket_width_ms must be greater than 0".to_string(),
            ));
        }
        if self.aggregation.comparison_window_secs <= 0 {
            return Err(Error::Config(
                "aggregation.comparison_window_secs must be greater than 0".to_string(),
            ));
        }
        if self.aggregation.comparison_window_secs > MAX_DURATION_SECS {
            return Err(Error::Config(format!(
                "aggregation.comparison_window_secs must be at most {}",
                MAX_DURATION_SECS
            )));
        }
        if self.sessions.bounce_threshold_secs < 0 {
            return Err(Error::Config(
                "sessions.bounce_threshold_secs must not be negative".to_string(),
            ));
        }
        if self.sessions.bounce_threshold_secs > MAX_DURATION_SECS {
            return Err(Error::Config(format!(
                "sessions.bounce_threshold_secs must be at most {}",
                MAX_DURATION_SECS
            )));
        }
        if self.sessions.inactivity_minutes <= 0 {
            return Err(Error::Config(
                "sessions.inactivity_minutes must be greater than 0".to_string(),
            ));
        }
        if self.sessions.inactivity_minutes > MAX_DURATION_SECS / 60 {
            return Err(Error::Config(format!(
                "sessions.inactivity_minutes must be at most {}",
                MAX_DURATION_SECS / 60
            )));
        }
        self.delivery.validate()
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/pagebeacon/config.toml` (~/.config/pagebeacon/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("pagebeacon").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite event store)
    ///
    /// `$XDG_DATA_HOME/pagebeacon/` (~/.local/share/pagebeacon/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("pagebeacon")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/pagebeacon/` (~/.local/state/pagebeacon/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("pagebeacon")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/pagebeacon/events.db`
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("events.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/pagebeacon/pagebeacon.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("pagebeacon.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
