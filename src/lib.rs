//! retrywise - structured error variants with retry classification
//!
//! The crate defines typed error variants that carry the metadata callers
//! need (HTTP status, validation field, timeout duration, retry-after
//! interval, circuit-breaker state, retry-budget exhaustion) and a single
//! policy for deciding whether any error, typed or not, should be retried.
//!
//! ```
//! use std::time::Duration;
//! use retrywise::{chain, is_permanent_error, is_retryable, HttpError, TimeoutError};
//! use retrywise::sentinel::{DEADLINE_EXCEEDED, DEADLOCK};
//!
//! assert!(is_retryable(&HttpError::new(429, "Too Many Requests")));
//! assert!(!is_permanent_error(&HttpError::new(429, "Too Many Requests")));
//!
//! let err = chain::wrap(&DEADLOCK, "transaction failed");
//! assert!(is_retryable(&*err));
//!
//! let err = TimeoutError::new("op timed out", "Fetch", Duration::from_secs(30))
//!     .with_cause(&DEADLINE_EXCEEDED);
//! assert!(!is_retryable(&err));
//! ```

pub mod chain;
pub mod classification;
pub mod config;
pub mod detector;
pub mod inspect;
pub mod logging;
pub mod report;
pub mod retryable;
pub mod sentinel;
pub mod variants;

/// Owned cause type stored by every variant.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[doc(hidden)]
pub use inventory;

pub use chain::{Chain, ChainFault};
pub use classification::{
    classify_result, default_classifier, install_default, is_permanent_error, is_retryable,
    is_retryable_timeout, is_transient_error, Classification, Classifier,
};
pub use config::{ClassifierConfig, ConfigError};
pub use detector::{FallbackPattern, TextFallback};
pub use inspect::{
    circuit_breaker_error, http_error, http_status_code, is_context_error, is_http_error,
    is_network_error, is_timeout, is_validation, network_error, retry_error, timeout_error,
    validation_error,
};
pub use retryable::{Retryable, RetryableProbe};
pub use sentinel::Sentinel;
pub use variants::{
    CircuitBreakerError, CircuitCounts, HttpError, NetworkError, ProcessingError, RateLimitError,
    RetryError, RetryableError, TimeoutError, ValidationError,
};
