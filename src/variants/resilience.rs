//! Symbolic circuit-breaker and retry-budget conditions.
//!
//! These variants describe what a breaker or retry loop decided. They hold no
//! state machine of their own.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{qualified, source_of, write_cause};
use crate::sentinel::{Sentinel, SentinelLink, CIRCUIT_HALF_OPEN, CIRCUIT_OPEN, RETRY_EXHAUSTED};
use crate::{BoxError, Retryable};

/// Request and outcome tallies of a circuit breaker at the time it tripped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitCounts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
}

/// What follows a circuit breaker error on the chain.
#[derive(Debug)]
enum Next {
    Cause(Option<BoxError>),
    Link(SentinelLink),
}

impl Next {
    fn for_state(state: &str, cause: Option<BoxError>) -> Self {
        match state_sentinel(state) {
            Some(sentinel) => Next::Link(SentinelLink::new(sentinel, cause)),
            None => Next::Cause(cause),
        }
    }

    fn into_cause(self) -> Option<BoxError> {
        match self {
            Next::Cause(cause) => cause,
            Next::Link(link) => link.into_cause(),
        }
    }

    fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            Next::Cause(cause) => cause.as_deref(),
            Next::Link(link) => link.cause(),
        }
    }
}

fn state_sentinel(state: &str) -> Option<&'static Sentinel> {
    match state {
        "open" => Some(&CIRCUIT_OPEN),
        "half-open" => Some(&CIRCUIT_HALF_OPEN),
        _ => None,
    }
}

/// A request rejected by a circuit breaker.
///
/// In state `open` the chain carries [`CIRCUIT_OPEN`], in state `half-open`
/// it carries [`CIRCUIT_HALF_OPEN`]. A cause, if set, follows the sentinel.
/// The breaker owns its own retry timing, so this error is never retryable.
#[derive(Debug)]
pub struct CircuitBreakerError {
    message: String,
    operation: String,
    component: Option<String>,
    state: String,
    counts: CircuitCounts,
    next: Next,
}

impl CircuitBreakerError {
    /// Creates a breaker error in the given state.
    pub fn new(
        message: impl Into<String>,
        operation: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        let state = state.into();
        Self {
            message: message.into(),
            operation: operation.into(),
            component: None,
            next: Next::for_state(&state, None),
            state,
            counts: CircuitCounts::default(),
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

    /// Sets the breaker state, relinking the matching sentinel and keeping the cause.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self.next = Next::for_state(&self.state, self.next.into_cause());
        self
    }

    /// Sets the breaker tallies.
    pub fn with_counts(mut self, counts: CircuitCounts) -> Self {
        self.counts = counts;
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.next = Next::for_state(&self.state, Some(cause.into()));
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

    /// The breaker state label, such as `open` or `half-open`.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the breaker tallies.
    pub fn counts(&self) -> CircuitCounts {
        self.counts
    }

    /// Returns the underlying cause, if set.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.next.cause()
    }
}

impl fmt::Display for CircuitBreakerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "circuit breaker {} for {}: {}",
            self.state,
            qualified(self.component.as_deref(), &self.operation),
            self.message
        )?;
        match self.cause() {
            Some(cause) => write!(f, ": {cause}"),
            None => Ok(()),
        }
    }
}

impl Error for CircuitBreakerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.next {
            Next::Cause(cause) => source_of(cause.as_ref()),
            Next::Link(link) => Some(link),
        }
    }
}

impl Retryable for CircuitBreakerError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// A retry loop gave up.
///
/// The chain continues to [`RETRY_EXHAUSTED`]. The last error and the full
/// error history are kept as data, not as chain links.
#[derive(Debug)]
pub struct RetryError {
    attempts: u32,
    max_attempts: u32,
    last_error: Option<BoxError>,
    all_errors: Vec<BoxError>,
    operation: String,
    component: Option<String>,
}

impl RetryError {
    /// Creates an error for a retry loop that made `attempts` of `max_attempts`.
    pub fn new(
        attempts: u32,
        max_attempts: u32,
        last_error: Option<BoxError>,
        all_errors: Vec<BoxError>,
    ) -> Self {
        Self {
            attempts,
            max_attempts,
            last_error,
            all_errors,
            operation: String::new(),
            component: None,
        }
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

    /// Returns the number of attempts made.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the error of the final attempt, if any.
    pub fn last_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.last_error.as_deref()
    }

    /// Returns the errors of every attempt, oldest first.
    pub fn all_errors(&self) -> &[BoxError] {
        &self.all_errors
    }

    /// Returns the operation that failed.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the component, if set.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "retry exhausted after {}/{} attempts",
            self.attempts, self.max_attempts
        )?;
        let op = qualified(self.component.as_deref(), &self.operation);
        if !op.is_empty() {
            write!(f, " for {op}")?;
        }
        write_cause(f, self.last_error.as_ref())
    }
}

impl Error for RetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&RETRY_EXHAUSTED)
    }
}

impl Retryable for RetryError {
    fn is_retryable(&self) -> bool {
        false
    }
}
