//! Retry and backoff policy.
//!
//! Classifies download failures (timeouts, throttling, connection drops) and
//! decides exponential backoff so the bootstrap can ride out transient hub
//! errors without retrying permanent ones such as 404 or a size-limit breach.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
