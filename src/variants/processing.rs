use std::error::Error;
use std::fmt;

use super::{qualified, source_of, write_cause};
use crate::{BoxError, Retryable};

/// A failure while processing an item.
///
/// Retryable when the explicit flag is set, or when the cause classifies as
/// retryable at the time of the check. A [`Classifier`](crate::Classifier)
/// judges the cause by its own rules. Calling [`Retryable::is_retryable`]
/// directly uses the default classifier.
#[derive(Debug)]
pub struct ProcessingError {
    message: String,
    operation: String,
    item_id: Option<String>,
    component: Option<String>,
    retryable: bool,
    cause: Option<BoxError>,
}

impl ProcessingError {
    /// Creates a processing error with the retryable flag cleared.
    pub fn new(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            operation: operation.into(),
            item_id: None,
            component: None,
            retryable: false,
            cause: None,
        }
    }

    /// Creates a processing error with the retryable flag already set.
    pub fn retryable(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new(message, operation).with_retryable(true)
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

    /// Sets the id of the item being processed.
    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// Sets the component that raised the error.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the explicit retryable flag.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
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

    /// Returns the item id, if set.
    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    /// Returns the component, if set.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// The explicit flag, ignoring the cause.
    pub fn retryable_flag(&self) -> bool {
        self.retryable
    }

    /// Returns the underlying cause, if set.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} failed",
            self.message,
            qualified(self.component.as_deref(), &self.operation)
        )?;
        if let Some(item_id) = &self.item_id {
            write!(f, " for item {item_id}")?;
        }
        let label = if self.retryable { "retryable" } else { "not retryable" };
        write!(f, " ({label})")?;
        write_cause(f, self.cause.as_ref())
    }
}

impl Error for ProcessingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        source_of(self.cause.as_ref())
    }
}

impl Retryable for ProcessingError {
    fn is_retryable(&self) -> bool {
        self.retryable
            || self
                .cause
                .as_deref()
                .is_some_and(|cause| crate::is_retryable(cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentinel::DEADLOCK;
    use crate::variants::{RateLimitError, ValidationError};
    use std::time::Duration;

    #[test]
    fn test_display() {
        let err = ProcessingError::new("import failed", "Ingest");
        assert_eq!(err.to_string(), "import failed: Ingest failed (not retryable)");

        let err = ProcessingError::retryable("import failed", "Ingest")
            .with_component("etl")
            .with_item_id("row-7")
            .with_cause("disk full");
        assert_eq!(
            err.to_string(),
            "import failed: etl/Ingest failed for item row-7 (retryable): disk full"
        );
    }

    #[test]
    fn test_label_reflects_stored_flag() {
        let err = ProcessingError::new("x", "Op").with_cause(RateLimitError::new(
            "slow",
            "Call",
            Duration::from_secs(1),
        ));
        assert!(err.is_retryable());
        assert!(!err.retryable_flag());
        assert!(err.to_string().contains("(not retryable)"));
    }

    #[test]
    fn test_retryability_derived_from_cause() {
        assert!(!ProcessingError::new("x", "Op").is_retryable());
        assert!(ProcessingError::new("x", "Op").with_cause(&DEADLOCK).is_retryable());
        assert!(!ProcessingError::new("x", "Op")
            .with_cause(ValidationError::new("bad", "id"))
            .is_retryable());
    }

    #[test]
    fn test_builders_round_trip() {
        let err = ProcessingError::new("a", "b")
            .with_message("decode failed")
            .with_operation("Decode")
            .with_item_id("42")
            .with_component("worker")
            .with_retryable(true)
            .with_cause("truncated frame");

        assert_eq!(err.message(), "decode failed");
        assert_eq!(err.operation(), "Decode");
        assert_eq!(err.item_id(), Some("42"));
        assert_eq!(err.component(), Some("worker"));
        assert!(err.retryable_flag());
        assert_eq!(err.cause().map(|c| c.to_string()), Some("truncated frame".into()));
        assert!(err.source().is_some());

        let err = ProcessingError::retryable("x", "Op").with_retryable(false);
        assert!(!err.retryable_flag());
        assert!(err.item_id().is_none());
        assert!(err.cause().is_none());
    }
}
