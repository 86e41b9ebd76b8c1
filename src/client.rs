use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Method, Response};
use serde::Serialize;

use crate::{
    backoff,
    correlation::{self, REQUEST_ID_HEADER, USER_IDENTITY_HEADER},
    retry, BodySource, ClientOptions, Request, RequestContext, Result, RetryHttpError,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP client with retries, backoff, and correlation ID chaining.
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct RetryHttpClient {
    http: reqwest::Client,
    options: ClientOptions,
}

impl Default for RetryHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryHttpClient {
    /// Creates a client with default options and a tuned transport
    /// (5 s connect timeout, 10 idle connections per host, 30 s idle
    /// timeout).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use retry_http::{RequestContext, RetryHttpClient};
    ///
    /// # async fn run() -> retry_http::Result<()> {
    /// let client = RetryHttpClient::new();
    /// let ctx = RequestContext::new();
    /// let response = client.get(&ctx, "http://localhost:8080/healthcheck").await?;
    /// println!("status: {}", response.status());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_options(ClientOptions::default())
    }

    /// Creates a client with the given options and the default transport.
    pub fn with_options(options: ClientOptions) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .expect("default HTTP transport must initialize");
        Self::with_http_client(http, options)
    }

    /// Creates a client over a caller-supplied transport, for tuning that
    /// this crate treats as pass-through (TLS settings, proxies, pools).
    pub fn with_http_client(http: reqwest::Client, options: ClientOptions) -> Self {
        Self { http, options }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends a GET request.
    pub async fn get(&self, ctx: &RequestContext, url: &str) -> Result<Response> {
        self.send(ctx, Request::parse(Method::GET, url)?).await
    }

    /// Sends a HEAD request.
    pub async fn head(&self, ctx: &RequestContext, url: &str) -> Result<Response> {
        self.send(ctx, Request::parse(Method::HEAD, url)?).await
    }

    /// Sends a POST with the given content type and body.
    pub async fn post(
        &self,
        ctx: &RequestContext,
        url: &str,
        content_type: &str,
        body: impl Into<BodySource>,
    ) -> Result<Response> {
        let request = Self::with_content_type(
            Request::parse(Method::POST, url)?.body(body),
            content_type,
        )?;
        self.send(ctx, request).await
    }

    /// Sends a PUT with the given content type and body.
    pub async fn put(
        &self,
        ctx: &RequestContext,
        url: &str,
        content_type: &str,
        body: impl Into<BodySource>,
    ) -> Result<Response> {
        let request =
            Self::with_content_type(Request::parse(Method::PUT, url)?.body(body), content_type)?;
        self.send(ctx, request).await
    }

    /// Sends a POST with a URL-encoded form body.
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        url: &str,
        form: &T,
    ) -> Result<Response> {
        let body = serde_urlencoded::to_string(form)?;
        self.post(ctx, url, FORM_CONTENT_TYPE, body).await
    }

    /// Dispatches a request with retries.
    ///
    /// The correlation header is derived from the context's upstream chain
    /// and set on the request, then attempt 1 is performed. A retryable
    /// outcome hands over to the backoff loop unless the destination path is
    /// exempt or retries are disabled. The terminal outcome is returned
    /// verbatim: a response with a 5xx status is `Ok`, and callers must
    /// inspect the status themselves.
    pub async fn send(&self, ctx: &RequestContext, mut request: Request) -> Result<Response> {
        if let Some(identity) = ctx.user_identity() {
            // an explicitly set identity on the request wins
            if !request.headers().contains_key(&USER_IDENTITY_HEADER) {
                request
                    .headers_mut()
                    .insert(USER_IDENTITY_HEADER, HeaderValue::from_str(identity)?);
            }
        }

        let chain = correlation::chain_value(ctx.request_id());
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, HeaderValue::from_str(&chain)?);

        let path_exempt = self.options.no_retry_paths.contains(request.url().path());

        let outcome = self.attempt(ctx, &request).await;
        if path_exempt || self.options.max_retries == 0 || !retry::want_retry(&outcome) {
            return outcome;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            path = request.url().path(),
            max_retries = self.options.max_retries,
            "first attempt retryable, entering backoff loop"
        );

        let request = &request;
        let send = move || self.attempt(ctx, request);
        backoff::run(ctx, self.options.max_retries, self.options.base_retry_delay, send).await
    }

    /// One attempt: fresh body, per-attempt timeout, raced against the
    /// context's cancellation for its whole duration. Cancellation observed
    /// after the send completes still wins over the send's own result.
    async fn attempt(&self, ctx: &RequestContext, request: &Request) -> Result<Response> {
        let transport_request = request.build(self.options.request_timeout);
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(RetryHttpError::Cancelled),
            result = self.http.execute(transport_request) => {
                if ctx.is_cancelled() {
                    return Err(RetryHttpError::Cancelled);
                }
                result.map_err(RetryHttpError::Transport)
            }
        }
    }

    fn with_content_type(mut request: Request, content_type: &str) -> Result<Request> {
        request
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        Ok(request)
    }
}
