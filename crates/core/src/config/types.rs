use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::board::BoardLimits;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub boards: BoardLimits,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// REST backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the backend API (e.g., "http://localhost:3000/api")
    pub url: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

/// Snapshot refresh configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Whether to poll the backend in the background
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Polling interval in milliseconds (default: 5000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    5000
}

/// Sanitized config for API responses (credentials in the backend URL redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub backend: SanitizedBackendConfig,
    pub refresh: RefreshConfig,
    pub boards: BoardLimits,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

fn redact_url(raw: &str) -> String {
    match reqwest::Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => raw.to_string(),
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            backend: SanitizedBackendConfig {
                url: redact_url(&config.backend.url),
                timeout_secs: config.backend.timeout_secs,
            },
            refresh: config.refresh.clone(),
            boards: config.boards.clone(),
        }
    }
}
