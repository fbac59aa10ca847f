//! reqwest-backed archive session with rate limiting
//!
//! One `HttpSession` is one authorized connection pool. Sessions created by the
//! same factory share a rate limiter so rotation never bypasses the quota.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Jitter, Quota};
use reqwest::Client;
use url::Url;

use super::{RawResponse, Session, SessionFactory};
use crate::app::client::config::ClientConfig;
use crate::auth::BearerToken;
use crate::errors::{AuthError, AuthResult, FetchError, FetchResult};

/// Rate limiter shared by every session of one factory
pub type SharedRateLimiter = Arc<governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Builds the rate limiter with the specified rate limit
pub fn build_rate_limiter(rate_limit_rps: u32) -> AuthResult<SharedRateLimiter> {
    let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| AuthError::InvalidRateLimit {
        reason: "Rate limit must be non-zero".to_string(),
    })?;
    Ok(Arc::new(governor::RateLimiter::direct(Quota::per_second(
        rps,
    ))))
}

/// HTTP session against the archive
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    rate_limiter: SharedRateLimiter,
}

impl HttpSession {
    /// Creates a session from a prepared client and a shared limiter
    pub fn new(client: Client, rate_limiter: SharedRateLimiter) -> Self {
        Self {
            client,
            rate_limiter,
        }
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn get(&self, url: &Url) -> FetchResult<RawResponse> {
        // Jitter avoids a thundering herd when a full pool wakes together
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            message: e.to_string(),
        })?;

        tracing::trace!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Creates fresh bearer-authorized sessions on demand
#[derive(Debug, Clone)]
pub struct LaadsSessionFactory {
    config: ClientConfig,
    token: BearerToken,
    rate_limiter: SharedRateLimiter,
}

impl LaadsSessionFactory {
    /// Creates a factory; fails early on an invalid rate limit or token
    pub fn new(config: ClientConfig, token: BearerToken) -> AuthResult<Self> {
        let rate_limiter = build_rate_limiter(config.rate_limit_rps)?;
        // Validate that a client can be built before any work is dispatched
        config.build_http_client(&token)?;
        Ok(Self {
            config,
            token,
            rate_limiter,
        })
    }

    /// Build a concrete session
    pub fn build_session(&self) -> AuthResult<HttpSession> {
        let client = self.config.build_http_client(&self.token)?;
        Ok(HttpSession::new(client, Arc::clone(&self.rate_limiter)))
    }
}

impl SessionFactory for LaadsSessionFactory {
    fn new_session(&self) -> FetchResult<Arc<dyn Session>> {
        let session = self
            .build_session()
            .map_err(|e| FetchError::SessionRotation {
                url: self.config.base_url().to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!("Created new archive session");
        Ok(Arc::new(session))
    }
}
