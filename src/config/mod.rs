//! Configuration management.

mod file_config;

pub use file_config::{find_config_file, load_config, ConfigError};

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{SourceType, MAX_RESULTS, MIN_RESULTS};
use crate::utils::RetryConfig;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Outbound HTTP settings shared by every source
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry settings for transient source failures
    #[serde(default)]
    pub retry: RetrySettings,

    /// Source selection and endpoints
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Search defaults
    #[serde(default)]
    pub search: SearchDefaults,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject settings that would make every search fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("http.timeout_seconds must be positive".into()));
        }
        if self.http.connect_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "http.connect_timeout_seconds must be positive".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if self.retry.max_total_seconds == 0 {
            return Err(ConfigError::Invalid("retry.max_total_seconds must be positive".into()));
        }
        if !(MIN_RESULTS..=MAX_RESULTS).contains(&self.search.default_max_results) {
            return Err(ConfigError::Invalid(format!(
                "search.default_max_results must be between {} and {}",
                MIN_RESULTS, MAX_RESULTS
            )));
        }
        self.sources.disabled_sources()?;
        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// User-Agent header sent to every source
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Retry settings as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Upper bound on one source search, retries included
    #[serde(default = "default_max_total_seconds")]
    pub max_total_seconds: u64,
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(self.max_total_seconds),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_total_seconds: default_max_total_seconds(),
        }
    }
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    4000
}

fn default_max_total_seconds() -> u64 {
    45
}

/// Source selection and endpoint overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Source ids that are never registered
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Contact email for the OpenAlex and Crossref polite pools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openalex_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossref_url: Option<String>,
}

impl SourcesConfig {
    /// Parse the disabled list into source types
    pub fn disabled_sources(&self) -> Result<Vec<SourceType>, ConfigError> {
        self.disabled
            .iter()
            .map(|name| {
                name.parse::<SourceType>()
                    .map_err(|e| ConfigError::Invalid(format!("sources.disabled: {}", e)))
            })
            .collect()
    }

    /// Base URL override for a source
    pub fn base_url(&self, source: SourceType) -> Option<&str> {
        match source {
            SourceType::Arxiv => self.arxiv_url.as_deref(),
            SourceType::OpenAlex => self.openalex_url.as_deref(),
            SourceType::CrossRef => self.crossref_url.as_deref(),
        }
    }
}

/// Defaults applied to requests that leave parameters out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDefaults {
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            default_max_results: default_max_results(),
        }
    }
}

fn default_max_results() -> usize {
    crate::models::DEFAULT_MAX_RESULTS
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
