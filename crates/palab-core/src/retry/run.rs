//! Retry loop: run a closure until success or policy says stop.

use std::time::{Duration, Instant};

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::control::CancelToken;
use crate::downloader::DownloadError;

/// Backoff sleeps are cut into slices this long so a cancel is seen promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
/// A cancelled `cancel` token ends the loop with `DownloadError::Cancelled`
/// instead of waiting out the backoff.
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    cancel: Option<&CancelToken>,
    mut f: F,
) -> Result<T, DownloadError>
where
    F: FnMut() -> Result<T, DownloadError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(attempt, ?kind, delay_ms = d.as_millis() as u64, "retrying after error: {}", e);
                        if !sleep_unless_cancelled(d, cancel) {
                            tracing::info!(attempt, "retry abandoned: cancelled");
                            return Err(DownloadError::Cancelled);
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}

/// Sleeps for `d`; returns false as soon as the token is cancelled.
fn sleep_unless_cancelled(d: Duration, cancel: Option<&CancelToken>) -> bool {
    let Some(token) = cancel else {
        std::thread::sleep(d);
        return true;
    };
    let deadline = Instant::now() + d;
    loop {
        if token.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}
