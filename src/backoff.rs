//! Exponential backoff loop with jitter and cancellation racing.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::Response;
use tokio::time::sleep;

use crate::{retry, RequestContext, Result, RetryHttpError};

// Caps the exponent so the shift cannot overflow; beyond this the delay is
// saturated anyway.
const MAX_EXPONENT: u32 = 16;

/// Computes the sleep before retry `attempt` (1-based): `2^attempt * base`
/// minus 1..=4 ms of jitter, so many clients sharing the same schedule do
/// not wake on the exact same boundary. Saturates at zero for tiny bases.
pub(crate) fn sleep_time(attempt: u32, base: Duration) -> Duration {
    let factor = 1u32 << attempt.min(MAX_EXPONENT);
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(1..=4));
    base.saturating_mul(factor).saturating_sub(jitter)
}

/// Drives up to `max_retries` further attempts after a retryable first one.
///
/// Each iteration sleeps for the backoff delay racing the context's
/// cancellation, replays the request via `send`, and re-checks cancellation
/// before trusting the attempt's result. Returns the first non-retryable
/// outcome, or the last outcome verbatim once attempts are exhausted.
pub(crate) async fn run<F, Fut>(
    ctx: &RequestContext,
    max_retries: usize,
    base_delay: Duration,
    mut send: F,
) -> Result<Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response>>,
{
    debug_assert!(max_retries > 0);

    let mut attempt: usize = 1;
    loop {
        let delay = sleep_time(attempt as u32, base_delay);

        #[cfg(feature = "tracing")]
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off before retry");

        tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(RetryHttpError::Cancelled),
            _ = sleep(delay) => {}
        }

        let outcome = send().await;
        // a result that raced a concurrent cancellation loses to it
        if ctx.is_cancelled() {
            return Err(RetryHttpError::Cancelled);
        }
        if !retry::want_retry(&outcome) || attempt >= max_retries {
            return outcome;
        }
        attempt += 1;
    }
}
