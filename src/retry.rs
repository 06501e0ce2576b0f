//! A reusable retry combinator with exponential backoff.
//!
//! Rate-limit responses from the transcription API are transient by
//! definition: the server is telling the caller to slow down and try again.
//! This module wraps any async operation with a classify-and-retry loop —
//! retryable failures wait out an exponentially growing delay (unbounded
//! attempts), anything else propagates on the spot.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Exponential backoff schedule: `initial`, doubled after each retry.
///
/// The schedule is unbounded — the caller bounds it by classifying which
/// errors are worth retrying at all.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    initial: Duration,
}

impl Backoff {
    /// Schedule starting at `initial` and doubling each step.
    pub fn new(initial: Duration) -> Self {
        Self { initial }
    }

    /// Schedule starting at `ms` milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

/// Run `op`, retrying with exponential backoff while `is_retryable` says so.
///
/// Retries are unbounded: the loop only ends when the operation succeeds or
/// fails with a non-retryable error. `op` is re-invoked from scratch for each
/// attempt, so it must be cheap to rebuild (a request body, not a connection
/// pool).
pub async fn retry_with_backoff<T, E, F, Fut, C>(
    mut op: F,
    is_retryable: C,
    backoff: Backoff,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut delay = backoff.initial;
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_retryable(&e) => {
                attempt += 1;
                warn!("retryable failure (attempt {attempt}), backing off {delay:?}: {e}");
                sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(e) => return Err(e),
        }
    }
}
