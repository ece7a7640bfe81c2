//! Environment configuration

use std::time::Duration;
use thiserror::Error;

/// Backend used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Base URL sources, highest precedence first
const BASE_URL_VARS: [&str; 2] = ["MEDASSIST_API_BASE_URL", "VITE_API_BASE_URL"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Connection settings for the question-answering backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Scheme, host and port; the endpoint path is appended by the client
    pub base_url: String,
    /// Whole-request timeout. `None` lets a hung request stay pending.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            connect_timeout: None,
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = match BASE_URL_VARS
            .iter()
            .find_map(|&var| lookup(var).map(|url| (var, url)))
        {
            Some((var, url)) if url.trim().is_empty() => return Err(ConfigError::Empty { var }),
            Some((_, url)) => url.trim().to_string(),
            None => DEFAULT_BASE_URL.to_string(),
        };

        Ok(Self {
            base_url,
            request_timeout: parse_seconds(&lookup, "MEDASSIST_REQUEST_TIMEOUT_SECS")?,
            connect_timeout: parse_seconds(&lookup, "MEDASSIST_CONNECT_TIMEOUT_SECS")?,
        })
    }
}

fn parse_seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
        _ => Err(ConfigError::InvalidSeconds { var, value }),
    }
}
