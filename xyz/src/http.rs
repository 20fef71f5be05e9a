//! HTTP client for the XYZ REST API

use reqwest::redirect::Policy;
use std::time::Duration;

/// Transport settings for the API client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub connect_timeout: Duration,
    pub tcp_keepalive: Duration,
    /// Informational only: reqwest has no separate handshake limit, so this
    /// value is never applied. The TLS handshake runs inside the connect phase
    /// and is bounded by `connect_timeout`.
    pub tls_handshake_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            tcp_keepalive: Duration::from_secs(30),
            tls_handshake_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(90),
            max_idle_per_host: 100,
            user_agent: format!("pulumi-resource-xyz/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Build the client used for all API calls. Redirects are never followed; a
/// redirect response surfaces as an error.
pub fn build_http_client(config: &HttpClientConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .tcp_keepalive(config.tcp_keepalive)
        .pool_idle_timeout(config.idle_timeout)
        .pool_max_idle_per_host(config.max_idle_per_host)
        .http1_only()
        .user_agent(config.user_agent.clone())
        .redirect(Policy::custom(|attempt| {
            attempt.error("unable to handle redirects")
        }))
        .build()
}
