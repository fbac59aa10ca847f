//! Retry and backoff policy for the resilient fetcher

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::limits;
use crate::errors::{ConfigError, ConfigResult};

/// How hard a single logical fetch tries before giving up
///
/// Backoff is linear: the wait before attempt `k` (`k >= 2`) is
/// `backoff_base + (k - 1) * backoff_increment`. No wait follows the final
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPolicy {
    /// Constant part of every backoff
    #[serde(with = "humantime_serde")]
    pub backoff_base: Duration,
    /// Added once per retry
    #[serde(with = "humantime_serde")]
    pub backoff_increment: Duration,
    /// Total attempts, counted from 1
    pub max_attempts: u32,
    /// Consecutive attempts allowed on one session before rotation
    pub attempts_per_session: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            backoff_base: limits::BACKOFF_BASE,
            backoff_increment: limits::BACKOFF_INCREMENT,
            max_attempts: limits::MAX_ATTEMPTS,
            attempts_per_session: limits::ATTEMPTS_PER_SESSION,
        }
    }
}

impl FetchPolicy {
    /// Wait before the given attempt number; zero for the first attempt
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.backoff_base + self.backoff_increment * (attempt - 1)
    }

    /// Cumulative wait of a fetch that uses every attempt
    pub fn total_backoff(&self) -> Duration {
        (2..=self.max_attempts)
            .map(|attempt| self.delay_before(attempt))
            .sum()
    }

    /// Reject budgets that would never issue a request
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.max_attempts".to_string(),
                value: "0".to_string(),
                reason: "At least one attempt is required".to_string(),
            });
        }
        if self.attempts_per_session == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.attempts_per_session".to_string(),
                value: "0".to_string(),
                reason: "At least one attempt per session is required".to_string(),
            });
        }
        Ok(())
    }
}
