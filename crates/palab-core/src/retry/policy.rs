//! Backoff schedule for hub downloads.
//!
//! A policy is always derived from a `[retry]` table; when the config has
//! none, `RetryConfig::default()` supplies the numbers.

use std::time::Duration;

use crate::config::RetryConfig;

/// Doubling stops after this many steps; `max_delay` usually caps earlier.
const MAX_DOUBLINGS: u32 = 8;

/// What kind of failure a download ended with, as far as retrying goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    /// 429 or 503.
    Throttled,
    Connection,
    /// Any other 5xx.
    ServerError(u16),
    /// 404, size-limit breach, local I/O, cancellation.
    Permanent,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, ErrorKind::Permanent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Never zero.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        let base_delay = Duration::try_from_secs_f64(cfg.base_delay_secs.max(0.0)).unwrap_or(Duration::ZERO);
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Wait before attempt `attempt + 1`: `base_delay * 2^(attempt - 1)`, at most `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let steps = attempt.saturating_sub(1).min(MAX_DOUBLINGS);
        self.base_delay
            .saturating_mul(1u32 << steps)
            .min(self.max_delay)
    }

    /// `attempt` is 1-based and counts the attempt that just failed.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt < self.max_attempts && kind.is_transient() {
            RetryDecision::RetryAfter(self.backoff(attempt))
        } else {
            RetryDecision::NoRetry
        }
    }
}
