//! Resilient fetch primitive
//!
//! One call to [`Fetcher::fetch`] is one logical "get this resource" operation:
//! it retries with linear backoff, refuses redirects, validates checksums and
//! content formats, and rotates sessions when one has been tried too often.
//! Failure is an ordinary value; callers record it and move on.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use laads_mirror::app::client::{ClientConfig, LaadsSessionFactory, SessionFactory};
//! use laads_mirror::app::fetch::{ContentValidator, FetchPolicy, FetchRequest, Fetcher};
//! use laads_mirror::auth::BearerToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = Arc::new(LaadsSessionFactory::new(
//!     ClientConfig::default(),
//!     BearerToken::from_env()?,
//! )?);
//! let fetcher = Fetcher::new(factory.new_session()?, FetchPolicy::default())
//!     .with_session_factory(factory);
//!
//! let request = FetchRequest::new("https://example.org/file.h5")
//!     .checksum("5d41402abc4b2a76b9719d911017c592")
//!     .validator(ContentValidator::Hdf5);
//! match fetcher.fetch(&request).await {
//!     Ok(content) => println!("{} bytes after {} attempts", content.body.len(), content.attempts),
//!     Err(e) => eprintln!("not obtained this run: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};
use url::Url;

use crate::app::client::{Session, SessionFactory};
use crate::constants::http;
use crate::errors::{FetchError, FetchResult};

pub mod policy;
pub mod validation;

pub use policy::FetchPolicy;
pub use validation::{md5_hex, verify_checksum, ContentValidator};

/// What to fetch and how to judge the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL
    pub url: String,
    /// Reference MD5 of the body, if known
    pub checksum: Option<String>,
    /// Every validator must accept the body
    pub validators: Vec<ContentValidator>,
}

impl FetchRequest {
    /// Plain request with no body checks
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            checksum: None,
            validators: Vec::new(),
        }
    }

    /// Require the body to hash to `checksum`; empty strings are ignored
    pub fn checksum(mut self, checksum: impl Into<String>) -> Self {
        let checksum = checksum.into();
        self.checksum = if checksum.trim().is_empty() {
            None
        } else {
            Some(checksum)
        };
        self
    }

    /// Add a content-format validator
    pub fn validator(mut self, validator: ContentValidator) -> Self {
        if !self.validators.contains(&validator) {
            self.validators.push(validator);
        }
        self
    }
}

/// Body of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    /// URL that was fetched
    pub url: String,
    /// Validated response body
    pub body: Vec<u8>,
    /// Attempt on which the fetch succeeded, counted from 1
    pub attempts: u32,
}

/// Retrying fetcher bound to a starting session
#[derive(Debug, Clone)]
pub struct Fetcher {
    session: Arc<dyn Session>,
    session_factory: Option<Arc<dyn SessionFactory>>,
    policy: FetchPolicy,
}

impl Fetcher {
    /// Fetcher that aborts once its session budget is spent
    pub fn new(session: Arc<dyn Session>, policy: FetchPolicy) -> Self {
        Self {
            session,
            session_factory: None,
            policy,
        }
    }

    /// Allow rotating to fresh sessions instead of aborting
    pub fn with_session_factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.session_factory = Some(factory);
        self
    }

    /// The retry policy in force
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetch one resource
    ///
    /// Rotation is local to this call: a rotated session is used for the
    /// remaining attempts of this fetch only, so concurrent fetches never
    /// observe each other's sessions.
    ///
    /// # Errors
    ///
    /// Returns a terminal [`FetchError`] (`MaxAttemptsReached`,
    /// `SessionExhausted`, `SessionRotation` or `InvalidUrl`) when the
    /// resource could not be obtained this run.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchedContent> {
        let url = Url::parse(&request.url).map_err(|e| FetchError::InvalidUrl {
            url: request.url.clone(),
            error: e.to_string(),
        })?;

        let mut session = Arc::clone(&self.session);
        let mut session_attempts = 0u32;
        let mut attempt = 0u32;

        loop {
            if attempt >= self.policy.max_attempts {
                error!(
                    "Request for {} reached maximum attempts ({})",
                    url, self.policy.max_attempts
                );
                return Err(FetchError::MaxAttemptsReached {
                    url: request.url.clone(),
                    max_attempts: self.policy.max_attempts,
                });
            }

            if session_attempts >= self.policy.attempts_per_session {
                match &self.session_factory {
                    Some(factory) => {
                        info!(
                            "Request for {} reached maximum attempts for session ({}). Rotating session",
                            url, self.policy.attempts_per_session
                        );
                        session = factory.new_session()?;
                        session_attempts = 0;
                    }
                    None => {
                        error!(
                            "Request for {} reached maximum attempts for session ({}) and no session factory was supplied",
                            url, self.policy.attempts_per_session
                        );
                        return Err(FetchError::SessionExhausted {
                            url: request.url.clone(),
                            attempts: attempt,
                        });
                    }
                }
            }

            attempt += 1;
            session_attempts += 1;

            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                debug!("Backing off {:?} before attempt {} for {}", delay, attempt, url);
                tokio::time::sleep(delay).await;
            }

            match self.attempt(session.as_ref(), &url, request).await {
                Ok(body) => {
                    debug!("Fetched {} on attempt {} ({} bytes)", url, attempt, body.len());
                    return Ok(FetchedContent {
                        url: request.url.clone(),
                        body,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    info!("Request for {}, attempt {} failed: {}", url, attempt, e);
                }
            }
        }
    }

    /// One GET plus every body check
    async fn attempt(
        &self,
        session: &dyn Session,
        url: &Url,
        request: &FetchRequest,
    ) -> FetchResult<Vec<u8>> {
        let response = session.get(url).await?;

        if response.status != http::SUCCESS_STATUS {
            return Err(FetchError::Status {
                status: response.status,
            });
        }

        if let Some(expected) = &request.checksum {
            verify_checksum(&response.body, expected)?;
        }

        for validator in &request.validators {
            validator.check(&response.body)?;
        }

        Ok(response.body)
    }
}
