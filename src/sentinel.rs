//! Sentinel errors used as identity anchors in error chains.
//!
//! A sentinel carries no payload. It exists so that code far away from the
//! raise site can ask "does this chain contain X?" without string matching.
//! Sentinels are compared by address, never by message text: two sentinels
//! with the same message are still different sentinels.

use std::error::Error;
use std::fmt;

use crate::BoxError;

/// A payload-free error value compared by identity.
///
/// Declare sentinels as `static` items so every reference points at the same
/// address:
///
/// ```
/// use retrywise::{chain, Sentinel};
///
/// static QUOTA_EXCEEDED: Sentinel = Sentinel::new("quota exceeded");
///
/// let err = chain::wrap(&QUOTA_EXCEEDED, "billing sync failed");
/// assert!(chain::is(&*err, &QUOTA_EXCEEDED));
/// ```
#[derive(Debug)]
pub struct Sentinel {
    message: &'static str,
}

impl Sentinel {
    /// Creates a sentinel with the given message.
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }

    /// Returns the sentinel's message.
    pub fn message(&self) -> &'static str {
        self.message
    }

    /// Returns true if `node` is this sentinel.
    ///
    /// Only the node itself is inspected; use [`chain::is`](crate::chain::is)
    /// to search a whole chain.
    pub fn matches(&'static self, node: &(dyn Error + 'static)) -> bool {
        if let Some(s) = node.downcast_ref::<Sentinel>() {
            return std::ptr::eq(s, self);
        }
        if let Some(s) = node.downcast_ref::<&'static Sentinel>() {
            return std::ptr::eq(*s, self);
        }
        if let Some(link) = node.downcast_ref::<SentinelLink>() {
            return std::ptr::eq(link.sentinel, self);
        }
        false
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl Error for Sentinel {}

/// A chain node that stands for a sentinel and continues to a cause.
///
/// Chains have a single successor per node, so a variant that needs both a
/// sentinel identity and its own cause on the chain links through one of
/// these.
#[derive(Debug)]
pub(crate) struct SentinelLink {
    sentinel: &'static Sentinel,
    cause: Option<BoxError>,
}

impl SentinelLink {
    pub(crate) fn new(sentinel: &'static Sentinel, cause: Option<BoxError>) -> Self {
        Self { sentinel, cause }
    }

    pub(crate) fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub(crate) fn into_cause(self) -> Option<BoxError> {
        self.cause
    }
}

impl fmt::Display for SentinelLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sentinel.message)
    }
}

impl Error for SentinelLink {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// API rate limiting.
pub static RATE_LIMITED: Sentinel = Sentinel::new("rate limited");

/// Network timeout.
pub static NETWORK_TIMEOUT: Sentinel = Sentinel::new("network timeout");

/// 5xx server error.
pub static SERVER_ERROR: Sentinel = Sentinel::new("server error");

/// Network connection failure.
pub static CONNECTION_ERROR: Sentinel = Sentinel::new("connection error");

/// Database deadlock.
pub static DEADLOCK: Sentinel = Sentinel::new("database deadlock");

/// Circuit breaker is open.
pub static CIRCUIT_OPEN: Sentinel = Sentinel::new("circuit breaker open");

/// Malformed or unexpected response.
pub static INVALID_RESPONSE: Sentinel = Sentinel::new("invalid response");

/// Circuit breaker is half-open and rejecting excess requests.
pub static CIRCUIT_HALF_OPEN: Sentinel =
    Sentinel::new("circuit breaker half-open, too many requests");

/// All retry attempts have been used.
pub static RETRY_EXHAUSTED: Sentinel = Sentinel::new("retry attempts exhausted");

/// A retry budget was configured with a non-positive attempt count.
pub static MAX_ATTEMPTS_INVALID: Sentinel = Sentinel::new("max retry attempts must be positive");

/// The governing deadline of the operation has passed.
pub static DEADLINE_EXCEEDED: Sentinel = Sentinel::new("context deadline exceeded");

/// The operation was canceled by its owner.
pub static CANCELED: Sentinel = Sentinel::new("context canceled");

/// Sentinels that make an error retryable in step three of
/// [`is_retryable`](crate::is_retryable).
pub(crate) static RETRYABLE: [&Sentinel; 6] = [
    &RATE_LIMITED,
    &NETWORK_TIMEOUT,
    &SERVER_ERROR,
    &CONNECTION_ERROR,
    &DEADLOCK,
    &CIRCUIT_OPEN,
];

/// Sentinels that make an error transient.
pub(crate) static TRANSIENT: [&Sentinel; 4] =
    [&RATE_LIMITED, &SERVER_ERROR, &CONNECTION_ERROR, &DEADLOCK];
