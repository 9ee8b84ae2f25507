//! Client configuration, read from `TRICOL_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const ENV_API_URL: &str = "TRICOL_API_URL";
pub const ENV_API_TIMEOUT_MS: &str = "TRICOL_API_TIMEOUT_MS";
pub const ENV_DEBUG_LOGS: &str = "TRICOL_DEBUG_LOGS";
pub const ENV_STORAGE_PATH: &str = "TRICOL_STORAGE_PATH";

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    pub api_timeout: Duration,
    pub enable_debug_logs: bool,
    /// File holding the persisted session tokens.
    pub storage_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_timeout: DEFAULT_API_TIMEOUT,
            enable_debug_logs: true,
            storage_path: default_storage_path(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match lookup(ENV_API_URL) {
            Some(url) if !url.trim().is_empty() => {
                config.api_url = url.trim().trim_end_matches('/').to_string();
            }
            _ => tracing::warn!(default = DEFAULT_API_URL, "{ENV_API_URL} not set; using default"),
        }

        if let Some(raw) = lookup(ENV_API_TIMEOUT_MS) {
            let millis = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: ENV_API_TIMEOUT_MS,
                expected: "a number of milliseconds",
                value: raw.clone(),
            })?;
            config.api_timeout = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup(ENV_DEBUG_LOGS) {
            config.enable_debug_logs = parse_bool(&raw).ok_or(ConfigError::Invalid {
                var: ENV_DEBUG_LOGS,
                expected: "a boolean",
                value: raw.clone(),
            })?;
        }

        if let Some(path) = lookup(ENV_STORAGE_PATH).filter(|p| !p.trim().is_empty()) {
            config.storage_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Absolute URL of an API endpoint, e.g. `endpoint("auth/login")`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Fallback log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.enable_debug_logs { "debug" } else { "info" }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_storage_path() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("tricol").join("session.json")
}
