use std::collections::HashSet;
use std::time::Duration;

/// Configures retry and timeout behavior.
///
/// Options are fixed at client construction. There is no shared default
/// instance and no setters: clients that need different behavior get their
/// own value, which also makes concurrent dispatches safe without locking.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Maximum number of retries after the initial attempt. Zero disables
    /// retrying entirely.
    pub max_retries: usize,
    /// Base delay for the exponential backoff schedule.
    pub base_retry_delay: Duration,
    /// Destination paths (exact match) that are never retried regardless of
    /// outcome.
    pub no_retry_paths: HashSet<String>,
    /// Timeout applied to each individual attempt, connection included.
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_retry_delay: Duration::from_millis(20),
            no_retry_paths: HashSet::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientOptions {
    /// Replaces the set of paths exempt from retries.
    pub fn with_no_retry_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.no_retry_paths = paths.into_iter().map(Into::into).collect();
        self
    }
}
