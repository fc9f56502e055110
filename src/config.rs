//! Application configuration
//!
//! Configuration is loaded from environment variables; every setting has a
//! default so the app starts without any of them.

use std::env;
use std::time::Duration;

pub const DEFAULT_XAI_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_XAI_MODEL: &str = "grok-3";
pub const DEFAULT_LOCATION_URL: &str = "https://ipinfo.io/json";
pub const DEFAULT_LOG_FILE: &str = "greentrace.log";
pub const DEFAULT_EXPORT_FILE: &str = "legal_records.csv";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Advice provider configuration
    pub advice: AdviceConfig,
    /// IP geolocation endpoint
    pub location_url: String,
    /// Timeout for outbound HTTP calls; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Where tracing output goes (stdout belongs to the terminal UI)
    pub log_file: String,
    /// Default target for legal record CSV export
    pub export_file: String,
}

#[derive(Debug, Clone)]
pub struct AdviceConfig {
    /// xAI API key; advice requests report an error when absent
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            advice: AdviceConfig::default(),
            location_url: DEFAULT_LOCATION_URL.to_string(),
            request_timeout: None,
            log_file: DEFAULT_LOG_FILE.to_string(),
            export_file: DEFAULT_EXPORT_FILE.to_string(),
        }
    }
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_XAI_BASE_URL.to_string(),
            model: DEFAULT_XAI_MODEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            advice: AdviceConfig {
                api_key: non_empty("XAI_API_KEY"),
                base_url: non_empty("GREENTRACE_XAI_BASE_URL").unwrap_or(defaults.advice.base_url),
                model: non_empty("GREENTRACE_XAI_MODEL").unwrap_or(defaults.advice.model),
            },
            location_url: non_empty("GREENTRACE_LOCATION_URL").unwrap_or(defaults.location_url),
            request_timeout: non_empty("GREENTRACE_REQUEST_TIMEOUT_SECS")
                .and_then(|secs| secs.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            log_file: non_empty("GREENTRACE_LOG_FILE").unwrap_or(defaults.log_file),
            export_file: non_empty("GREENTRACE_EXPORT_FILE").unwrap_or(defaults.export_file),
        }
    }
}
