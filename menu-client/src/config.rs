//! Client configuration

use std::time::Duration;

use crate::{ClientError, ClientResult};

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g. "https://xyz.supabase.co")
    pub base_url: String,

    /// Public (anon) API key, sent as `apikey` on every request
    pub anon_key: String,

    /// Request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `<base>/rest/v1/<table>`
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// `<base>/auth/v1/<path>`
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// `ws(s)://<host>/realtime/v1/websocket?apikey=..&vsn=1.0.0`
    pub fn realtime_url(&self) -> ClientResult<String> {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(ClientError::Config(format!(
                "backend url must start with http:// or https://: {}",
                self.base_url
            )));
        };
        Ok(format!(
            "{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.anon_key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = ClientConfig::new("https://demo.example.co/", "anon");
        assert_eq!(config.rest_url("menus"), "https://demo.example.co/rest/v1/menus");
        assert_eq!(
            config.auth_url("token?grant_type=password"),
            "https://demo.example.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            config.realtime_url().unwrap(),
            "wss://demo.example.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );
    }

    #[test]
    fn test_realtime_url_rejects_unknown_scheme() {
        let config = ClientConfig::new("localhost:54321", "anon");
        assert!(matches!(config.realtime_url(), Err(ClientError::Config(_))));
    }
}
