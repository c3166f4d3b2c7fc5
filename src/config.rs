//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::client::{ApiClientConfig, Dataset, EtlClientConfig, DEFAULT_TOP_N};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub etl: EtlConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Primary data API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_api_url() -> String {
    "http://localhost:8081/api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    10_000 // 10 seconds
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        ApiClientConfig {
            base_url: config.base_url.clone(),
            request_timeout_ms: config.request_timeout_ms,
        }
    }
}

/// ETL analytics service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
    #[serde(default = "default_etl_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub dataset: Dataset,

    #[serde(default = "default_top_n")]
    pub top_n: u32,
}

fn default_etl_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_top_n() -> u32 {
    DEFAULT_TOP_N
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            base_url: default_etl_url(),
            request_timeout_ms: default_request_timeout(),
            dataset: Dataset::default(),
            top_n: default_top_n(),
        }
    }
}

impl From<&EtlConfig> for EtlClientConfig {
    fn from(config: &EtlConfig) -> Self {
        EtlClientConfig {
            base_url: config.base_url.clone(),
            request_timeout_ms: config.request_timeout_ms,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
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
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("opensound").join("config.toml")),
            Some(PathBuf::from("/etc/opensound/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key/value lookup
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("OPENSOUND_API_URL") {
            self.api.base_url = url;
        }
        if let Some(url) = lookup("OPENSOUND_ETL_URL") {
            self.etl.base_url = url;
        }
        if let Some(timeout) = lookup("OPENSOUND_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.api.request_timeout_ms = ms;
                self.etl.request_timeout_ms = ms;
            }
        }

        if let Some(level) = lookup("OPENSOUND_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("OPENSOUND_LOG_FORMAT") {
            if let Some(format) = LogFormat::parse(&format) {
                self.logging.format = format;
            }
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
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# OpenSound Configuration
#
# Environment variables override these settings:
# - OPENSOUND_API_URL
# - OPENSOUND_ETL_URL
# - OPENSOUND_TIMEOUT_MS (applies to both services)
# - OPENSOUND_LOG_LEVEL
# - OPENSOUND_LOG_FORMAT

[api]
# Music data API, including the version prefix
base_url = "http://localhost:8081/api/v1"

# Request timeout in milliseconds
request_timeout_ms = 10000

[etl]
# Spotify ETL analytics service
base_url = "http://localhost:8000"

# Request timeout in milliseconds
request_timeout_ms = 10000

# Popularity partition: high or low
dataset = "high"

# Entries returned by the top-N endpoints
top_n = 5

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8081/api/v1");
        assert_eq!(config.etl.base_url, "http://localhost:8000");
        assert_eq!(config.etl.dataset, Dataset::High);
        assert_eq!(config.etl.top_n, 5);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.api.request_timeout_ms, 10_000);
        assert_eq!(config.etl.top_n, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[etl]\ndataset = \"low\"\ntop_n = 10\n\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.etl.dataset, Dataset::Low);
        assert_eq!(config.etl.top_n, 10);
        assert_eq!(config.etl.base_url, "http://localhost:8000");
        assert_eq!(config.api.base_url, "http://localhost:8081/api/v1");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();

        let missing = Config::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[api\nbase_url = 3").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OPENSOUND_API_URL", "http://api.internal/api/v1"),
            ("OPENSOUND_ETL_URL", "http://etl.internal"),
            ("OPENSOUND_TIMEOUT_MS", "2500"),
            ("OPENSOUND_LOG_FORMAT", "JSON"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://api.internal/api/v1");
        assert_eq!(config.etl.base_url, "http://etl.internal");
        assert_eq!(config.api.request_timeout_ms, 2500);
        assert_eq!(config.etl.request_timeout_ms, 2500);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "OPENSOUND_TIMEOUT_MS" => Some("soon".to_string()),
            "OPENSOUND_LOG_FORMAT" => Some("xml".to_string()),
            _ => None,
        });

        assert_eq!(config.api.request_timeout_ms, 10_000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_client_config_conversion() {
        let config = Config::default();
        let api: ApiClientConfig = (&config.api).into();
        let etl: EtlClientConfig = (&config.etl).into();
        assert_eq!(api.base_url, config.api.base_url);
        assert_eq!(etl.request_timeout_ms, config.etl.request_timeout_ms);
    }
}
