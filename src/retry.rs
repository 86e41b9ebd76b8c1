use reqwest::{Response, StatusCode};

use crate::{Result, RetryHttpError};

/// Classifies one attempt's outcome as retryable or final.
///
/// Retryable: transport-level failure (no response at all), any 5xx status,
/// and 409 Conflict (transient optimistic-concurrency signal). Everything
/// else — including 429 — is final, and cancellation is never retried.
/// Stateless; applied identically to the first attempt and every retry.
pub(crate) fn want_retry(outcome: &Result<Response>) -> bool {
    match outcome {
        Ok(response) => {
            let status = response.status();
            status.is_server_error() || status == StatusCode::CONFLICT
        }
        Err(RetryHttpError::Transport(_)) => true,
        Err(_) => false,
    }
}
