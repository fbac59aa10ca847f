//! Archive session settings and reqwest client construction
//!
//! Redirects are never followed. On this archive a redirect means the session
//! is no longer authorized, and the fetcher answers it by rotating sessions.

use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::auth::BearerToken;
use crate::constants::{http, laads, limits};
use crate::errors::AuthResult;

/// Configuration for archive HTTP sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the archive's all-data tree
    pub base_url: String,
    /// Keep-alive probe interval, off when unset
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// Send small listing requests without Nagle buffering
    pub tcp_nodelay: bool,
    /// How long an unused pooled connection survives
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Idle connections kept open to the archive host
    pub pool_max_per_host: usize,
    /// Upper bound on one GET, body included
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Upper bound on establishing the connection
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Requests per second shared by every session of a factory
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: laads::ALLDATA_URL.to_string(),
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

impl ClientConfig {
    /// Builds an HTTP client that carries the bearer token on every request
    pub fn build_http_client(&self, token: &BearerToken) -> AuthResult<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token.header_value()?);

        let mut builder = Client::builder()
            .redirect(Policy::none())
            .default_headers(headers)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(keepalive) = self.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        if let Some(idle) = self.pool_idle_timeout {
            builder = builder.pool_idle_timeout(idle);
        }

        Ok(builder.build()?)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
