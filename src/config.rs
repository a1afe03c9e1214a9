//! Client configuration

use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the diagnostic client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (without the `/api` suffix)
    pub server_url: String,
    /// Username supplied to the authentication provider
    pub username: Option<String>,
    /// Upper bound for a single backend exchange
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            username: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let server_url = lookup("SYMPTOM_CHAT_SERVER")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let username = lookup("SYMPTOM_CHAT_USER")
            .or_else(|| lookup("USER"))
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let request_timeout = lookup("SYMPTOM_CHAT_TIMEOUT_SECS")
            .and_then(|t| t.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);

        Self {
            server_url,
            username,
            request_timeout,
        }
    }
}
