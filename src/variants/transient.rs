//! Variants for failures that are expected to clear up on their own.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use super::{qualified, source_of, write_cause};
use crate::{BoxError, Retryable};

/// The remote side asked us to slow down.
#[derive(Debug)]
pub struct RateLimitError {
    message: String,
    operation: String,
    component: Option<String>,
    retry_after: Duration,
    cause: Option<BoxError>,
}

impl RateLimitError {
    /// Creates a rate-limit error with the wait the remote side asked for.
    pub fn new(message: impl Into<String>, operation: impl Into<String>, retry_after: Duration) -> Self {
        Self {
            message: message.into(),
            operation: operation.into(),
            component: None,
            retry_after,
            cause: None,
        }
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the operation that failed.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Sets the component that raised the error.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the operation that failed.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the component, if set.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// How long the remote side asked us to wait.
    pub fn retry_after(&self) -> Duration {
        self.retry_after
    }

    /// Returns the underlying cause, if set.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rate limited in {} (retry after {:?}): {}",
            qualified(self.component.as_deref(), &self.operation),
            self.retry_after,
            self.message
        )?;
        write_cause(f, self.cause.as_ref())
    }
}

impl Error for RateLimitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        source_of(self.cause.as_ref())
    }
}

impl Retryable for RateLimitError {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// A generic temporary failure with a suggested wait.
///
/// Broader than [`RateLimitError`]: use it for any condition the caller can
/// expect to clear after `retry_after`.
#[derive(Debug)]
pub struct RetryableError {
    message: String,
    operation: String,
    component: Option<String>,
    retry_after: Duration,
    cause: Option<BoxError>,
}

impl RetryableError {
    /// Creates a retryable error with a suggested wait.
    pub fn new(message: impl Into<String>, operation: impl Into<String>, retry_after: Duration) -> Self {
        Self {
            message: message.into(),
            operation: operation.into(),
            component: None,
            retry_after,
            cause: None,
        }
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the operation that failed.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Sets the component that raised the error.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the operation that failed.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the component, if set.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Returns the suggested wait before retrying.
    pub fn retry_after(&self) -> Duration {
        self.retry_after
    }

    /// Returns the underlying cause, if set.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for RetryableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "retryable error in {} (retry after {:?}): {}",
            qualified(self.component.as_deref(), &self.operation),
            self.retry_after,
            self.message
        )?;
        write_cause(f, self.cause.as_ref())
    }
}

impl Error for RetryableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        source_of(self.cause.as_ref())
    }
}

impl Retryable for RetryableError {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// An operation ran out of time.
///
/// Reports itself retryable, but a deadline or cancellation anywhere in its
/// chain takes precedence during classification.
#[derive(Debug)]
pub struct TimeoutError {
    message: String,
    operation: String,
    component: Option<String>,
    duration: Duration,
    cause: Option<BoxError>,
}

impl TimeoutError {
    /// Creates a timeout error for an operation that exceeded `duration`.
    pub fn new(message: impl Into<String>, operation: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            operation: operation.into(),
            component: None,
            duration,
            cause: None,
        }
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the operation that failed.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Sets the component that raised the error.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the operation that failed.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the component, if set.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// The time limit that was exceeded.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the underlying cause, if set.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timeout in {} after {:?}: {}",
            qualified(self.component.as_deref(), &self.operation),
            self.duration,
            self.message
        )?;
        write_cause(f, self.cause.as_ref())
    }
}

impl Error for TimeoutError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        source_of(self.cause.as_ref())
    }
}

impl Retryable for TimeoutError {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// A network connectivity failure.
#[derive(Debug)]
pub struct NetworkError {
    message: String,
    operation: String,
    component: Option<String>,
    transient: bool,
    cause: Option<BoxError>,
}

impl NetworkError {
    /// Creates a transient network error.
    pub fn new(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            operation: operation.into(),
            component: None,
            transient: true,
            cause: None,
        }
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the operation that failed.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Sets the component that raised the error.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Marks the failure as transient or persistent.
    pub fn with_transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the operation that failed.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the component, if set.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Returns true if the failure is expected to clear up.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Returns the underlying cause, if set.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "network error in {} ({}): {}",
            qualified(self.component.as_deref(), &self.operation),
            if self.transient { "transient" } else { "persistent" },
            self.message
        )?;
        write_cause(f, self.cause.as_ref())
    }
}

impl Error for NetworkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        source_of(self.cause.as_ref())
    }
}

impl Retryable for NetworkError {
    fn is_retryable(&self) -> bool {
        self.transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentinel::NETWORK_TIMEOUT;

    #[test]
    fn test_rate_limit_display() {
        let err = RateLimitError::new("slow down", "Search", Duration::from_secs(30));
        assert_eq!(err.to_string(), "rate limited in Search (retry after 30s): slow down");

        let err = err.with_component("github").with_cause("quota reset pending");
        assert_eq!(
            err.to_string(),
            "rate limited in github/Search (retry after 30s): slow down: quota reset pending"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_retryable_error_display() {
        let err = RetryableError::new("lock held", "Sync", Duration::from_millis(250))
            .with_component("store");
        assert_eq!(
            err.to_string(),
            "retryable error in store/Sync (retry after 250ms): lock held"
        );
        assert_eq!(err.retry_after(), Duration::from_millis(250));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_timeout_display_and_cause() {
        let err = TimeoutError::new("op timed out", "Fetch", Duration::from_secs(30))
            .with_cause(&NETWORK_TIMEOUT);

        assert_eq!(
            err.to_string(),
            "timeout in Fetch after 30s: op timed out: network timeout"
        );
        let source = err.source().expect("cause should be on the chain");
        assert!(NETWORK_TIMEOUT.matches(source));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_network_defaults_transient() {
        let err = NetworkError::new("connection refused", "Dial");
        assert!(err.is_transient());
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "network error in Dial (transient): connection refused");

        let err = err.with_transient(false);
        assert!(!err.is_transient());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "network error in Dial (persistent): connection refused");
    }

    #[test]
    fn test_builders_round_trip() {
        let err = TimeoutError::new("a", "b", Duration::ZERO)
            .with_message("read stalled")
            .with_operation("Read")
            .with_component("disk");

        assert_eq!(err.message(), "read stalled");
        assert_eq!(err.operation(), "Read");
        assert_eq!(err.component(), Some("disk"));
        assert_eq!(err.duration(), Duration::ZERO);
        assert!(err.cause().is_none());

        let err = err.with_cause("disk stalled");
        assert_eq!(err.cause().map(|c| c.to_string()), Some("disk stalled".into()));

        let err = NetworkError::new("a", "b")
            .with_message("reset")
            .with_operation("Send")
            .with_component("rpc")
            .with_transient(false)
            .with_cause("peer closed");
        assert_eq!(err.message(), "reset");
        assert_eq!(err.operation(), "Send");
        assert_eq!(err.component(), Some("rpc"));
        assert!(!err.is_transient());
        assert_eq!(err.cause().map(|c| c.to_string()), Some("peer closed".into()));
    }

    #[test]
    fn test_rate_limit_builders_round_trip() {
        let err = RateLimitError::new("a", "b", Duration::from_secs(5))
            .with_message("quota exceeded")
            .with_operation("Search")
            .with_component("github")
            .with_cause("secondary limit");

        assert_eq!(err.message(), "quota exceeded");
        assert_eq!(err.operation(), "Search");
        assert_eq!(err.component(), Some("github"));
        assert_eq!(err.retry_after(), Duration::from_secs(5));
        assert_eq!(err.cause().map(|c| c.to_string()), Some("secondary limit".into()));
        assert_eq!(err.source().map(|s| s.to_string()), Some("secondary limit".into()));
    }

    #[test]
    fn test_retryable_error_builders_round_trip() {
        let err = RetryableError::new("a", "b", Duration::from_millis(100));
        assert!(err.component().is_none());
        assert!(err.cause().is_none());

        let err = err
            .with_message("lock held")
            .with_operation("Sync")
            .with_component("store")
            .with_cause("lease busy");

        assert_eq!(err.message(), "lock held");
        assert_eq!(err.operation(), "Sync");
        assert_eq!(err.component(), Some("store"));
        assert_eq!(err.retry_after(), Duration::from_millis(100));
        assert_eq!(err.cause().map(|c| c.to_string()), Some("lease busy".into()));
        assert_eq!(err.source().map(|s| s.to_string()), Some("lease busy".into()));
    }
}
