//! `retry-http` is an async HTTP client that retries transient failures.
//!
//! The crate wraps [`reqwest`] with:
//! - exponential backoff with jitter between attempts
//! - cooperative cancellation via [`RequestContext`]
//! - per-path retry opt-out ([`ClientOptions::no_retry_paths`])
//! - chained `x-request-id` correlation headers for cross-service tracing
//!
//! Entry points: [`RetryHttpClient::send`] and the convenience verbs
//! ([`RetryHttpClient::get`], [`RetryHttpClient::post`], ...).

mod backoff;
mod client;
mod context;
mod correlation;
mod error;
mod options;
mod request;
mod retry;

pub use client::RetryHttpClient;
pub use context::RequestContext;
pub use correlation::{REQUEST_ID_HEADER, USER_IDENTITY_HEADER};
pub use error::RetryHttpError;
pub use options::ClientOptions;
pub use request::{BodySource, Request};

pub type Result<T> = std::result::Result<T, RetryHttpError>;
