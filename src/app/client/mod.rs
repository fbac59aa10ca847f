//! HTTP sessions for LAADS archive interaction
//!
//! The fetcher talks to the archive through the [`Session`] trait so that the
//! retry, validation and rotation policy can be exercised without a network.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: reqwest-backed sessions, the shared rate limiter and the session factory

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::errors::FetchResult;

pub mod config;
pub mod http;

pub use config::ClientConfig;
pub use http::{HttpSession, LaadsSessionFactory};

/// Status and body of a single GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code, redirects included
    pub status: u16,
    /// Full response body
    pub body: Vec<u8>,
}

/// One authorized way of issuing GET requests
#[async_trait]
pub trait Session: Send + Sync + Debug {
    /// Issue a single GET without following redirects
    async fn get(&self, url: &Url) -> FetchResult<RawResponse>;
}

/// Produces replacement sessions when one is worn out
pub trait SessionFactory: Send + Sync + Debug {
    /// Create a brand new session
    fn new_session(&self) -> FetchResult<Arc<dyn Session>>;
}
