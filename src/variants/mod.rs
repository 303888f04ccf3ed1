//! Typed error variants.
//!
//! Each variant carries the metadata a caller needs to decide what to do with
//! a failure, reports its own retryability, and keeps its cause reachable
//! through [`Error::source`]. Values are built with `new` plus `with_*`
//! builders and are read-only afterwards.

mod http;
mod processing;
mod resilience;
mod transient;
mod validation;

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use crate::BoxError;

pub use http::HttpError;
pub use processing::ProcessingError;
pub use resilience::{CircuitBreakerError, CircuitCounts, RetryError};
pub use transient::{NetworkError, RateLimitError, RetryableError, TimeoutError};
pub use validation::ValidationError;

crate::register_retryable!(
    HttpError,
    RateLimitError,
    RetryableError,
    TimeoutError,
    ValidationError,
    ProcessingError,
    NetworkError,
    CircuitBreakerError,
    RetryError,
);

/// `component/operation` when a component is set, else the bare operation.
fn qualified<'a>(component: Option<&str>, operation: &'a str) -> Cow<'a, str> {
    match component {
        Some(component) => Cow::Owned(format!("{component}/{operation}")),
        None => Cow::Borrowed(operation),
    }
}

/// Appends `: {cause}` when a cause is set.
fn write_cause(f: &mut fmt::Formatter<'_>, cause: Option<&BoxError>) -> fmt::Result {
    match cause {
        Some(cause) => write!(f, ": {cause}"),
        None => Ok(()),
    }
}

fn source_of(cause: Option<&BoxError>) -> Option<&(dyn Error + 'static)> {
    cause.map(|c| &**c as &(dyn Error + 'static))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_operation() {
        assert_eq!(qualified(None, "Fetch"), "Fetch");
        assert_eq!(qualified(Some("api"), "Fetch"), "api/Fetch");
    }
}
