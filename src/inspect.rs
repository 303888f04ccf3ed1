//! Typed lookups over an error chain.
//!
//! Each lookup returns the nearest matching node, searching from the
//! outermost error inward.

use std::error::Error;
use std::io;

use crate::chain::{self, Chain};
use crate::sentinel::{CANCELED, DEADLINE_EXCEEDED};
use crate::variants::{
    CircuitBreakerError, HttpError, NetworkError, RetryError, TimeoutError, ValidationError,
};

/// Returns the nearest [`HttpError`] in the chain.
pub fn http_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a HttpError> {
    chain::find(err)
}

/// Returns the nearest [`ValidationError`] in the chain.
pub fn validation_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a ValidationError> {
    chain::find(err)
}

/// Returns the nearest [`NetworkError`] in the chain.
pub fn network_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a NetworkError> {
    chain::find(err)
}

/// Returns the nearest [`TimeoutError`] in the chain.
pub fn timeout_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a TimeoutError> {
    chain::find(err)
}

/// Returns the nearest [`CircuitBreakerError`] in the chain.
pub fn circuit_breaker_error<'a>(
    err: &'a (dyn Error + 'static),
) -> Option<&'a CircuitBreakerError> {
    chain::find(err)
}

/// Returns the nearest [`RetryError`] in the chain.
pub fn retry_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a RetryError> {
    chain::find(err)
}

/// Status code of the nearest [`HttpError`].
pub fn http_status_code(err: &(dyn Error + 'static)) -> Option<u16> {
    http_error(err).map(HttpError::status_code)
}

/// Returns true if the chain contains an [`HttpError`].
pub fn is_http_error(err: &(dyn Error + 'static)) -> bool {
    http_error(err).is_some()
}

/// Returns true if the chain contains a [`ValidationError`].
pub fn is_validation(err: &(dyn Error + 'static)) -> bool {
    validation_error(err).is_some()
}

/// True for a typed [`NetworkError`] or a lower-level connectivity failure
/// from `std::io` or `reqwest`.
pub fn is_network_error(err: &(dyn Error + 'static)) -> bool {
    network_error(err).is_some() || Chain::new(err).any(is_connectivity_node)
}

/// True for a typed [`TimeoutError`], an I/O timeout, a `reqwest` timeout, or
/// an elapsed `tokio::time::timeout`.
pub fn is_timeout(err: &(dyn Error + 'static)) -> bool {
    Chain::new(err).any(|node| {
        node.is::<TimeoutError>()
            || node.is::<tokio::time::error::Elapsed>()
            || node
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::TimedOut)
            || node
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout)
    })
}

/// True if the chain records a passed deadline or a cancellation.
pub fn is_context_error(err: &(dyn Error + 'static)) -> bool {
    Chain::new(err).any(|node| is_deadline_node(node) || is_cancel_node(node))
}

pub(crate) fn is_deadline_node(node: &(dyn Error + 'static)) -> bool {
    DEADLINE_EXCEEDED.matches(node) || node.is::<tokio::time::error::Elapsed>()
}

pub(crate) fn is_cancel_node(node: &(dyn Error + 'static)) -> bool {
    CANCELED.matches(node)
        || node
            .downcast_ref::<tokio::task::JoinError>()
            .is_some_and(tokio::task::JoinError::is_cancelled)
}

pub(crate) fn is_connectivity_node(node: &(dyn Error + 'static)) -> bool {
    if let Some(e) = node.downcast_ref::<io::Error>() {
        return matches!(
            e.kind(),
            io::ErrorKind::ConnectionRefused
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected
                | io::ErrorKind::AddrInUse
                | io::ErrorKind::AddrNotAvailable
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::TimedOut
        );
    }
    node.downcast_ref::<reqwest::Error>()
        .is_some_and(|e| e.is_connect() || e.is_timeout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::wrap;
    use crate::sentinel::RATE_LIMITED;
    use std::time::Duration;

    #[test]
    fn test_typed_lookups() {
        let err = wrap(HttpError::new(503, "unavailable"), "calling billing");

        assert_eq!(http_status_code(&*err), Some(503));
        assert!(is_http_error(&*err));
        assert!(!is_validation(&*err));
        assert!(timeout_error(&*err).is_none());
        assert!(retry_error(&*err).is_none());
        assert!(circuit_breaker_error(&*err).is_none());
    }

    #[test]
    fn test_nearest_http_error_wins() {
        let inner = HttpError::new(500, "inner");
        let outer = HttpError::new(404, "outer").with_cause(inner);
        assert_eq!(http_status_code(&outer), Some(404));
    }

    #[test]
    fn test_status_code_absent() {
        assert_eq!(http_status_code(&RATE_LIMITED), None);
    }

    #[test]
    fn test_validation_lookup() {
        let err = wrap(ValidationError::new("empty", "name"), "signup");
        let found = validation_error(&*err).expect("validation error in chain");
        assert_eq!(found.field(), "name");
        assert!(is_validation(&*err));
    }

    #[test]
    fn test_network_error_shapes() {
        assert!(is_network_error(&NetworkError::new("down", "Dial")));

        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(is_network_error(&refused));
        assert!(network_error(&refused).is_none());

        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert!(!is_network_error(&missing));
    }

    #[test]
    fn test_timeout_shapes() {
        assert!(is_timeout(&TimeoutError::new("slow", "Read", Duration::from_secs(1))));
        assert!(is_timeout(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(!is_timeout(&io::Error::from(io::ErrorKind::NotFound)));

        let wrapped = wrap(io::Error::from(io::ErrorKind::TimedOut), "reading socket");
        assert!(is_timeout(&*wrapped));
    }

    #[test]
    fn test_context_errors() {
        assert!(is_context_error(&*wrap(&DEADLINE_EXCEEDED, "query")));
        assert!(is_context_error(&*wrap(&CANCELED, "query")));
        assert!(!is_context_error(&RATE_LIMITED));
    }
}
