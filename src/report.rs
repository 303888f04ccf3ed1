//! Formatting and structured reporting of errors for logs.

use std::backtrace::BacktraceStatus;
use std::error::Error;

use serde::Serialize;
use serde_json::Value;

use crate::chain::Chain;
use crate::sentinel::SentinelLink;
use crate::variants::{
    CircuitBreakerError, HttpError, NetworkError, ProcessingError, RateLimitError, RetryError,
    RetryableError, TimeoutError, ValidationError,
};
use crate::{is_retryable, Retryable, Sentinel};

const REDACTED: &str = "<redacted>";

/// Short type label with the variant's key detail, e.g. `HttpError(503)`.
fn type_label(err: &(dyn Error + 'static)) -> Option<String> {
    if let Some(e) = err.downcast_ref::<HttpError>() {
        return Some(format!("HttpError({})", e.status_code()));
    }
    if let Some(e) = err.downcast_ref::<ValidationError>() {
        return Some(format!("ValidationError({})", e.field()));
    }
    if let Some(e) = err.downcast_ref::<TimeoutError>() {
        return Some(format!("TimeoutError({:?})", e.duration()));
    }
    if let Some(e) = err.downcast_ref::<RateLimitError>() {
        return Some(format!("RateLimitError({:?})", e.retry_after()));
    }
    if let Some(e) = err.downcast_ref::<RetryableError>() {
        return Some(format!("RetryableError({:?})", e.retry_after()));
    }
    if let Some(e) = err.downcast_ref::<ProcessingError>() {
        let label = if e.is_retryable() { "retryable" } else { "not retryable" };
        return Some(format!("ProcessingError({label})"));
    }
    if let Some(e) = err.downcast_ref::<NetworkError>() {
        let label = if e.is_transient() { "transient" } else { "persistent" };
        return Some(format!("NetworkError({label})"));
    }
    if let Some(e) = err.downcast_ref::<CircuitBreakerError>() {
        return Some(format!("CircuitBreakerError({})", e.state()));
    }
    if let Some(e) = err.downcast_ref::<RetryError>() {
        return Some(format!("RetryError({}/{})", e.attempts(), e.max_attempts()));
    }
    None
}

/// Formats the outermost error with its type, e.g.
/// `HttpError(500): HTTP 500: Internal Server Error`.
///
/// Errors of other types are labelled `Error`.
pub fn format_error(err: &(dyn Error + 'static)) -> String {
    let label = type_label(err).unwrap_or_else(|| "Error".to_string());
    format!("{label}: {err}")
}

/// Structured description of an error for logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl ErrorInfo {
    fn base(kind: &'static str, err: &(dyn Error + 'static)) -> Self {
        Self {
            kind,
            message: err.to_string(),
            retryable: is_retryable(err),
            status_code: None,
            field: None,
            value: None,
            operation: None,
            duration: None,
            retry_after: None,
            item_id: None,
            transient: None,
            state: None,
            attempts: None,
            max_attempts: None,
        }
    }
}

/// Describes the outermost error, including its classification.
pub fn error_info(err: &(dyn Error + 'static)) -> ErrorInfo {
    if let Some(e) = err.downcast_ref::<HttpError>() {
        return ErrorInfo {
            status_code: Some(e.status_code()),
            ..ErrorInfo::base("HttpError", err)
        };
    }
    if let Some(e) = err.downcast_ref::<ValidationError>() {
        return ErrorInfo {
            field: Some(e.field().to_string()),
            value: (!e.value().is_null()).then(|| e.value().clone()),
            ..ErrorInfo::base("ValidationError", err)
        };
    }
    if let Some(e) = err.downcast_ref::<TimeoutError>() {
        return ErrorInfo {
            operation: Some(e.operation().to_string()),
            duration: Some(format!("{:?}", e.duration())),
            ..ErrorInfo::base("TimeoutError", err)
        };
    }
    if let Some(e) = err.downcast_ref::<RateLimitError>() {
        return ErrorInfo {
            operation: Some(e.operation().to_string()),
            retry_after: Some(format!("{:?}", e.retry_after())),
            ..ErrorInfo::base("RateLimitError", err)
        };
    }
    if let Some(e) = err.downcast_ref::<RetryableError>() {
        return ErrorInfo {
            operation: Some(e.operation().to_string()),
            retry_after: Some(format!("{:?}", e.retry_after())),
            ..ErrorInfo::base("RetryableError", err)
        };
    }
    if let Some(e) = err.downcast_ref::<ProcessingError>() {
        return ErrorInfo {
            operation: Some(e.operation().to_string()),
            item_id: e.item_id().map(str::to_string),
            ..ErrorInfo::base("ProcessingError", err)
        };
    }
    if let Some(e) = err.downcast_ref::<NetworkError>() {
        return ErrorInfo {
            operation: Some(e.operation().to_string()),
            transient: Some(e.is_transient()),
            ..ErrorInfo::base("NetworkError", err)
        };
    }
    if let Some(e) = err.downcast_ref::<CircuitBreakerError>() {
        return ErrorInfo {
            operation: Some(e.operation().to_string()),
            state: Some(e.state().to_string()),
            ..ErrorInfo::base("CircuitBreakerError", err)
        };
    }
    if let Some(e) = err.downcast_ref::<RetryError>() {
        return ErrorInfo {
            operation: (!e.operation().is_empty()).then(|| e.operation().to_string()),
            attempts: Some(e.attempts()),
            max_attempts: Some(e.max_attempts()),
            ..ErrorInfo::base("RetryError", err)
        };
    }
    ErrorInfo::base("Error", err)
}

fn is_sentinel_node(node: &(dyn Error + 'static)) -> bool {
    node.is::<Sentinel>() || node.is::<&'static Sentinel>() || node.is::<SentinelLink>()
}

/// Renders the whole chain with message text replaced by `<redacted>`.
///
/// Type labels, status codes, field names, durations, flags, states and
/// sentinel texts are kept, so the result is safe to ship to shared logs:
///
/// ```
/// use retrywise::{report, HttpError};
///
/// let err = HttpError::new(500, "Internal Server Error").with_cause("db password: hunter2");
/// assert_eq!(
///     report::safe_details(&err),
///     "HttpError(500): <redacted>: <redacted>"
/// );
/// ```
pub fn safe_details(err: &(dyn Error + 'static)) -> String {
    let mut parts = Vec::new();
    for node in Chain::new(err) {
        if is_sentinel_node(node) {
            parts.push(node.to_string());
            continue;
        }
        if let Some(label) = type_label(node) {
            parts.push(label);
        }
        parts.push(REDACTED.to_string());
    }
    parts.join(": ")
}

/// The captured backtrace, if one was captured.
///
/// Capture is enabled with `RUST_BACKTRACE=1` or `RUST_LIB_BACKTRACE=1`.
pub fn stack_trace(err: &anyhow::Error) -> Option<String> {
    let backtrace = err.backtrace();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

/// The captured backtrace split into trimmed, non-empty lines.
pub fn stack_trace_lines(err: &anyhow::Error) -> Vec<String> {
    stack_trace(err)
        .map(|trace| {
            trace
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Returns true if a backtrace was captured for `err`.
pub fn has_stack_trace(err: &anyhow::Error) -> bool {
    err.backtrace().status() == BacktraceStatus::Captured
}

/// Emits one event describing `err`, at `warn` when it is retryable and at
/// `error` otherwise.
pub fn log_error(err: &(dyn Error + 'static)) {
    let info = error_info(err);
    let details = serde_json::to_string(&info).unwrap_or_default();

    if info.retryable {
        tracing::warn!(
            error.kind = info.kind,
            error.status_code = info.status_code,
            error.operation = info.operation.as_deref(),
            retryable = true,
            details = %details,
            "{}",
            info.message
        );
    } else {
        tracing::error!(
            error.kind = info.kind,
            error.status_code = info.status_code,
            error.operation = info.operation.as_deref(),
            retryable = false,
            details = %details,
            "{}",
            info.message
        );
    }
}
