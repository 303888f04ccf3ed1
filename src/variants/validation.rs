use std::error::Error;
use std::fmt;

use serde_json::Value;

use super::{source_of, write_cause};
use crate::{BoxError, Retryable};

/// Input that failed validation. Never retryable.
#[derive(Debug)]
pub struct ValidationError {
    message: String,
    field: String,
    component: Option<String>,
    value: Value,
    cause: Option<BoxError>,
}

impl ValidationError {
    /// Creates a validation error for `field` with a null value.
    pub fn new(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: field.into(),
            component: None,
            value: Value::Null,
            cause: None,
        }
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Replaces the name of the offending field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Sets the component that raised the error.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Records the offending value.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
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

    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the component, if set.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Returns the offending value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the underlying cause, if set.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

/// Strings print bare, everything else as JSON.
struct DisplayValue<'a>(&'a Value);

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        if let Some(component) = &self.component {
            write!(f, " in {component}")?;
        }
        write!(
            f,
            " for field '{}' (value: {})",
            self.field,
            DisplayValue(&self.value)
        )?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        write_cause(f, self.cause.as_ref())
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        source_of(self.cause.as_ref())
    }
}

impl Retryable for ValidationError {
    fn is_retryable(&self) -> bool {
        false
    }
}
