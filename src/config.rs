// Configuration for the stale order reaper, loaded once at startup
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `api.api_key`
pub const API_KEY_ENV: &str = "KRAKEN_API_KEY";
/// Environment variable overriding `api.api_secret`
pub const API_SECRET_ENV: &str = "KRAKEN_API_SECRET";

/// Bar granularities (minutes) accepted by Kraken's OHLC endpoint
pub const KRAKEN_INTERVALS: [u32; 9] = [1, 5, 15, 30, 60, 240, 1440, 10080, 21600];

/// Complete configuration structure matching config.toml.example
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    #[serde(default = "default_pair")]
    pub pair: String,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_fast_window")]
    pub fast_window: usize,
    #[serde(default = "default_slow_window")]
    pub slow_window: usize,
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default = "default_log_dir")]
    pub log_directory: String,
}

// Default value functions
fn default_rest_url() -> String { "https://api.kraken.com".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_pair() -> String { "XXDGZUSD".to_string() }
fn default_interval_minutes() -> u32 { 1 }
fn default_poll_interval() -> u64 { 15 }
fn default_fast_window() -> usize { 5 }
fn default_slow_window() -> usize { 15 }
fn default_min_bars() -> usize { 15 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_dir() -> String { "logs".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: "YOUR_API_KEY".to_string(),
            api_secret: "YOUR_API_SECRET".to_string(),
            rest_url: default_rest_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            pair: default_pair(),
            interval_minutes: default_interval_minutes(),
            poll_interval_seconds: default_poll_interval(),
            fast_window: default_fast_window(),
            slow_window: default_slow_window(),
            min_bars: default_min_bars(),
            dry_run: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            log_directory: default_log_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            reconciler: ReconcilerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_file_with_options(path, false)
    }

    /// Load configuration from a file, optionally skipping credential checks
    /// (public market data needs no keys)
    pub fn from_file_with_options<P: AsRef<Path>>(path: P, skip_api_keys: bool) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.apply_env_overrides();
        config.validate(skip_api_keys)?;
        Ok(config)
    }

    /// Load configuration or return error with helpful message
    pub fn load_or_error<P: AsRef<Path>>(path: P, skip_api_keys: bool) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::NotInitialized(
                format!(
                    "Config file not found: {}\n\
                     Run: reaper init\n\
                     Then edit config.toml with your API keys",
                    path_ref.display()
                )
            ));
        }

        Self::from_file_with_options(path_ref, skip_api_keys)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Replace credentials with `KRAKEN_API_KEY` / `KRAKEN_API_SECRET` when set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api.api_key = key.trim().to_string();
            }
        }
        if let Ok(secret) = std::env::var(API_SECRET_ENV) {
            if !secret.trim().is_empty() {
                self.api.api_secret = secret.trim().to_string();
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self, skip_api_keys: bool) -> Result<(), ConfigError> {
        if !skip_api_keys && !self.has_valid_api_keys() {
            return Err(ConfigError::Validation(
                format!(
                    "API credentials not configured. Edit config.toml or set {} / {}",
                    API_KEY_ENV, API_SECRET_ENV
                )
            ));
        }

        let r = &self.reconciler;

        if r.pair.trim().is_empty() {
            return Err(ConfigError::Validation("pair must not be empty".to_string()));
        }

        if !KRAKEN_INTERVALS.contains(&r.interval_minutes) {
            return Err(ConfigError::Validation(format!(
                "interval_minutes must be one of {:?}, got {}",
                KRAKEN_INTERVALS, r.interval_minutes
            )));
        }

        if r.poll_interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_seconds must be greater than 0".to_string()
            ));
        }

        if r.fast_window == 0 {
            return Err(ConfigError::Validation("fast_window must be greater than 0".to_string()));
        }

        if r.fast_window >= r.slow_window {
            return Err(ConfigError::Validation(format!(
                "fast_window ({}) must be less than slow_window ({})",
                r.fast_window, r.slow_window
            )));
        }

        if r.min_bars < r.slow_window {
            return Err(ConfigError::Validation(format!(
                "min_bars ({}) must be at least slow_window ({})",
                r.min_bars, r.slow_window
            )));
        }

        if self.api.request_timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_seconds must be greater than 0".to_string()
            ));
        }

        Ok(())
    }

    /// Check if API keys are configured
    pub fn has_valid_api_keys(&self) -> bool {
        !self.api.api_key.contains("YOUR_API_KEY") &&
        !self.api.api_secret.contains("YOUR_API_SECRET") &&
        !self.api.api_key.is_empty() &&
        !self.api.api_secret.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Configuration not initialized:\n{0}")]
    NotInitialized(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.api.api_key = "key".to_string();
        config.api.api_secret = "c2VjcmV0".to_string();
        config
    }

    #[test]
    fn test_defaults_match_reference_policy() {
        let config = Config::default();
        assert_eq!(config.reconciler.pair, "XXDGZUSD");
        assert_eq!(config.reconciler.interval_minutes, 1);
        assert_eq!(config.reconciler.poll_interval_seconds, 15);
        assert_eq!(config.reconciler.fast_window, 5);
        assert_eq!(config.reconciler.slow_window, 15);
        assert_eq!(config.reconciler.min_bars, 15);
        assert!(!config.reconciler.dry_run);
    }

    #[test]
    fn test_placeholder_keys_rejected() {
        let config = Config::default();
        assert!(config.validate(false).is_err());
        assert!(config.validate(true).is_ok());
        assert!(configured().validate(false).is_ok());
    }

    #[test]
    fn test_window_ordering_enforced() {
        let mut config = configured();
        config.reconciler.fast_window = 15;
        assert!(matches!(config.validate(false), Err(ConfigError::Validation(_))));

        let mut config = configured();
        config.reconciler.min_bars = 10;
        assert!(matches!(config.validate(false), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unsupported_interval_rejected() {
        let mut config = configured();
        config.reconciler.interval_minutes = 2;
        let err = config.validate(false).unwrap_err();
        assert!(err.to_string().contains("interval_minutes"));
    }

    #[test]
    fn test_sections_optional_in_toml() {
        let toml_str = r#"
            [api]
            api_key = "abc"
            api_secret = "def"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.rest_url, "https://api.kraken.com");
        assert_eq!(config.reconciler.slow_window, 15);
        assert_eq!(config.logging.level, "info");
    }
}
