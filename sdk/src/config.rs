//! Client configuration

use std::time::Duration;

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.lastmile.app";

/// Client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent as `X-API-Key` on every request
    pub api_key: String,

    /// Base URL of the API
    pub base_url: String,

    /// Emit non-error request logs
    pub debug: bool,

    /// Timeout applied to every transport call
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration with defaults and the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            debug: false,
            timeout: Duration::from_secs(30),
        }
    }
}
