use std::error::Error;
use std::fmt;

use super::{source_of, write_cause};
use crate::{BoxError, Retryable};

/// A failed HTTP exchange.
#[derive(Debug)]
pub struct HttpError {
    status_code: u16,
    message: String,
    component: Option<String>,
    cause: Option<BoxError>,
}

impl HttpError {
    /// Creates an error for a response with the given status code.
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            component: None,
            cause: None,
        }
    }

    /// Creates an internal server error (status 500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// Creates an error from a response status, using its canonical reason
    /// phrase as the message.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown status"),
        )
    }

    /// Replaces the HTTP status code.
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
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

    /// Returns the HTTP status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the component, if set.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Returns the underlying cause, if set.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Returns true for a 4xx status other than 429.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code) && self.status_code != 429
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: ", self.status_code)?;
        if let Some(component) = &self.component {
            write!(f, "{component}: ")?;
        }
        f.write_str(&self.message)?;
        write_cause(f, self.cause.as_ref())
    }
}

impl Error for HttpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        source_of(self.cause.as_ref())
    }
}

impl Retryable for HttpError {
    /// Server errors and 429 are worth retrying.
    fn is_retryable(&self) -> bool {
        self.status_code >= 500 || self.status_code == 429
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = HttpError::new(404, "not found");
        assert_eq!(err.to_string(), "HTTP 404: not found");

        let err = HttpError::new(502, "bad gateway")
            .with_component("billing")
            .with_cause("upstream closed");
        assert_eq!(err.to_string(), "HTTP 502: billing: bad gateway: upstream closed");
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 503, 599] {
            assert!(HttpError::new(status, "x").is_retryable(), "{status}");
        }
        for status in [400, 401, 404, 499] {
            assert!(!HttpError::new(status, "x").is_retryable(), "{status}");
        }
    }

    #[test]
    fn test_client_error() {
        assert!(HttpError::new(400, "x").is_client_error());
        assert!(!HttpError::new(429, "x").is_client_error());
        assert!(!HttpError::new(500, "x").is_client_error());
    }

    #[test]
    fn test_internal_and_from_status() {
        let err = HttpError::internal("boom");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "boom");

        let err = HttpError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.message(), "Too Many Requests");
    }

    #[test]
    fn test_builders_round_trip() {
        let err = HttpError::new(200, "ok")
            .with_status_code(503)
            .with_message("unavailable")
            .with_component("gateway");

        assert_eq!(err.status_code(), 503);
        assert_eq!(err.message(), "unavailable");
        assert_eq!(err.component(), Some("gateway"));
        assert!(err.cause().is_none());
        assert!(err.source().is_none());

        let err = err.with_cause("connection reset");
        assert_eq!(err.cause().map(|c| c.to_string()), Some("connection reset".into()));
        assert_eq!(err.source().map(|s| s.to_string()), Some("connection reset".into()));
    }
}
