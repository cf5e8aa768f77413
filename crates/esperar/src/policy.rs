//! Retry policies: timeout budgets and inter-attempt intervals.
//!
//! A [`RetryPolicy`] governs a single `retry_until` invocation: how long to
//! keep retrying and how long to sleep between attempts, with an optional
//! backoff strategy for the interval.

use crate::result::{EsperarError, EsperarResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout budget for retry operations (2 minutes)
pub const DEFAULT_RETRY_TIMEOUT_MS: u64 = 120_000;

/// Default delay between attempts (500ms)
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 500;

/// Default timeout for element lookups (10 seconds)
pub const DEFAULT_FIND_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// BACKOFF
// =============================================================================

/// Strategy for evolving the inter-attempt interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Backoff {
    /// Same interval between every attempt
    Fixed,
    /// Interval grows by `multiplier` after each failure, capped
    Exponential {
        /// Growth factor applied after each failed attempt
        multiplier: f64,
        /// Upper bound for the interval in milliseconds
        max_interval_ms: u64,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed
    }
}

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Configuration for a retry operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum wall-clock time to keep retrying, in milliseconds
    pub timeout_ms: u64,
    /// Delay between attempts, in milliseconds
    pub interval_ms: u64,
    /// How the interval evolves across attempts
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_RETRY_TIMEOUT_MS,
            interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout budget in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set delay between attempts in milliseconds
    #[must_use]
    pub const fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Set the backoff strategy
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get initial interval as Duration
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Check the policy's input contract (`timeout_ms > 0`)
    pub fn validate(&self) -> EsperarResult<()> {
        if self.timeout_ms == 0 {
            return Err(EsperarError::InvalidPolicy {
                message: "timeout_ms must be greater than zero".to_string(),
            });
        }
        if let Backoff::Exponential { multiplier, .. } = self.backoff {
            if multiplier < 1.0 {
                return Err(EsperarError::InvalidPolicy {
                    message: format!("backoff multiplier must be >= 1.0, got {multiplier}"),
                });
            }
        }
        Ok(())
    }

    /// Compute the interval to use after one more failed attempt
    #[must_use]
    pub fn next_interval(&self, current: Duration) -> Duration {
        match self.backoff {
            Backoff::Fixed => current,
            Backoff::Exponential {
                multiplier,
                max_interval_ms,
            } => {
                let grown = Duration::from_secs_f64(current.as_secs_f64() * multiplier);
                grown.min(Duration::from_millis(max_interval_ms))
            }
        }
    }
}
