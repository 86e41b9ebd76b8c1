use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};

use crate::{Result, RetryHttpError};

/// An outbound request owned by the retry layer.
///
/// Unlike a bare `reqwest::Request`, the body is held as a [`BodySource`] so
/// an identical copy can be replayed on every retry attempt. [`build`]
/// produces a fresh transport request per attempt.
///
/// [`build`]: Request::build
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<BodySource>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Parses `url` and constructs a request, failing on malformed input.
    pub fn parse(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|err| RetryHttpError::InvalidUrl(err.to_string()))?;
        Ok(Self::new(method, url))
    }

    pub fn body(mut self, body: impl Into<BodySource>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Builds a transport request for one attempt, reacquiring the body so a
    /// stream consumed by a prior attempt is never reused.
    pub(crate) fn build(&self, timeout: Duration) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        if let Some(body) = &self.body {
            *request.body_mut() = Some(reqwest::Body::from(body.reacquire()));
        }
        *request.timeout_mut() = Some(timeout);
        request
    }
}

/// A replayable request body.
///
/// Retrying means sending the same logical body more than once; a single-use
/// stream cannot do that, so bodies are either owned bytes (cheaply cloned)
/// or a factory invoked once per attempt.
#[derive(Clone)]
pub enum BodySource {
    Bytes(Bytes),
    Factory(Arc<dyn Fn() -> Bytes + Send + Sync>),
}

impl BodySource {
    /// Returns a fresh, byte-identical copy of the body for one attempt.
    pub fn reacquire(&self) -> Bytes {
        match self {
            Self::Bytes(bytes) => bytes.clone(),
            Self::Factory(factory) => factory(),
        }
    }

    /// Wraps a factory producing the body bytes for each attempt.
    pub fn from_factory(factory: impl Fn() -> Bytes + Send + Sync + 'static) -> Self {
        Self::Factory(Arc::new(factory))
    }
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Factory(_) => f.debug_tuple("Factory").finish(),
        }
    }
}

impl From<Bytes> for BodySource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for BodySource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<String> for BodySource {
    fn from(text: String) -> Self {
        Self::Bytes(text.into())
    }
}

impl From<&str> for BodySource {
    fn from(text: &str) -> Self {
        Self::Bytes(Bytes::copy_from_slice(text.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn bytes_body_reacquires_identical_copies() {
        let body = BodySource::from(r#"{"dummy":"ook"}"#);
        assert_eq!(body.reacquire(), body.reacquire());
    }

    #[test]
    fn factory_body_is_invoked_once_per_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let body = BodySource::from_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Bytes::from_static(b"payload")
        });

        assert_eq!(body.reacquire(), Bytes::from_static(b"payload"));
        assert_eq!(body.reacquire(), Bytes::from_static(b"payload"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn build_applies_headers_body_and_timeout() {
        let mut request = Request::parse(Method::POST, "http://localhost:9090/ook")
            .expect("url must parse")
            .body("hello");
        request.headers_mut().insert(
            reqwest::header::CONTENT_TYPE,
            "text/plain".parse().expect("valid header value"),
        );

        let built = request.build(Duration::from_millis(250));
        assert_eq!(built.method(), Method::POST);
        assert_eq!(built.url().path(), "/ook");
        assert_eq!(
            built.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        assert!(built.body().is_some());
        assert_eq!(built.timeout(), Some(&Duration::from_millis(250)));
    }

    #[test]
    fn parse_rejects_malformed_urls() {
        let err = Request::parse(Method::GET, "not a url").unwrap_err();
        assert!(matches!(err, RetryHttpError::InvalidUrl(_)));
    }
}
