use std::time::Duration;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Cancellation and tracing context for one logical request.
///
/// Clones share the same cancellation signal, so a context handed to
/// [`crate::RetryHttpClient::send`] can be cancelled from another task.
/// Cancellation is one-shot and monotonic: once fired it stays fired, and it
/// aborts in-flight attempts and backoff sleeps immediately.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    request_id: Option<String>,
    user_identity: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an upstream correlation chain (the inbound `x-request-id`
    /// value) so the outgoing request extends it instead of starting fresh.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attaches a user identity to propagate on outgoing requests.
    pub fn with_user_identity(mut self, identity: impl Into<String>) -> Self {
        self.user_identity = Some(identity.into());
        self
    }

    /// Arms a deadline: the context cancels itself after `timeout`.
    ///
    /// Must be called within a Tokio runtime.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let token = self.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            token.cancel();
        });
        self
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn user_identity(&self) -> Option<&str> {
        self.user_identity.as_deref()
    }

    /// Fires the cancellation signal for this context and all its clones.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_monotonic_and_shared_across_clones() {
        let ctx = RequestContext::new();
        let clone = ctx.clone();
        assert!(!ctx.is_cancelled());

        clone.cancel();
        assert!(ctx.is_cancelled());
        assert!(clone.is_cancelled());

        // firing again changes nothing
        ctx.cancel();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn deadline_fires_the_token() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(10));
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn carries_request_id_and_user_identity() {
        let ctx = RequestContext::new()
            .with_request_id("call1234")
            .with_user_identity("svc-importer");
        assert_eq!(ctx.request_id(), Some("call1234"));
        assert_eq!(ctx.user_identity(), Some("svc-importer"));
    }
}
