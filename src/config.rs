//! Client configuration parsed from environment variables.

use std::path::PathBuf;

/// Base URL used when `API_URL` is empty (the local dev proxy target).
pub const DEFAULT_LOCAL_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TOKEN_FILE: &str = ".sems/tokens.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Direct API base URL; empty means local.
    pub api_url: String,
    /// Gateway base URL; when non-empty, requests go through it instead.
    pub gateway_url: String,
    pub token_file: PathBuf,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            gateway_url: String::new(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            timeouts: Timeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `API_URL`: default empty (local)
    /// - `API_GATEWAY_URL`: default empty (local)
    /// - `SEMS_TOKEN_FILE`: default `.sems/tokens.json`
    /// - `SEMS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SEMS_CONNECT_TIMEOUT_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        let api_url = normalize_url(&std::env::var("API_URL").unwrap_or_default());
        let gateway_url = normalize_url(&std::env::var("API_GATEWAY_URL").unwrap_or_default());
        let token_file = std::env::var("SEMS_TOKEN_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE), PathBuf::from);
        let timeouts = Timeouts {
            request_secs: env_parse_u64("SEMS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("SEMS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Self { api_url, gateway_url, token_file, timeouts }
    }

    /// The base URL requests are sent to: gateway first, then API, then local.
    #[must_use]
    pub fn effective_base_url(&self) -> &str {
        if !self.gateway_url.is_empty() {
            &self.gateway_url
        } else if !self.api_url.is_empty() {
            &self.api_url
        } else {
            DEFAULT_LOCAL_API_URL
        }
    }
}

/// Trim whitespace and trailing slashes so endpoints can be appended.
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
