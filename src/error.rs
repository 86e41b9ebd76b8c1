/// Error type returned by this crate.
///
/// A response carrying a server-error status is **not** an error: the caller
/// receives `Ok(response)` and must inspect the status code. Errors are
/// reserved for outcomes where no usable response exists.
#[derive(Debug, thiserror::Error)]
pub enum RetryHttpError {
    /// Network or request execution error from `reqwest`, including
    /// per-attempt timeouts.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The request context was cancelled. Takes priority over any result
    /// obtained concurrently with the cancellation.
    #[error("request cancelled")]
    Cancelled,
    /// The target URL could not be parsed.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    /// A header value contained bytes not representable on the wire.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    /// Form body serialization failed.
    #[error("form encoding error: {0}")]
    FormEncode(#[from] serde_urlencoded::ser::Error),
}
