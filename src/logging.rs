//! Optional subscriber setup for the crate's diagnostics.
//!
//! The crate only emits `tracing` events: `trace!` for the rule that decided
//! a classification, `debug!` for full classifications, `warn!` for chain
//! faults and retryable errors passed to
//! [`log_error`](crate::report::log_error), `error!` for the rest. Applications that
//! already install a subscriber need nothing from this module. For small
//! binaries and tests, [`init_logging`] installs a stderr `fmt` subscriber
//! that honours `RUST_LOG`.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::BoxError;

/// Log level for the events of this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Every classification step
    Trace,
    /// Full classifications
    Debug,
    Info,
    /// Chain faults and retryable errors (default)
    #[default]
    Warn,
    Error,
    /// Disable logging entirely
    Off,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl From<LogLevel> for Option<Level> {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Some(Level::TRACE),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Off => None,
        }
    }
}

impl From<u8> for LogLevel {
    /// Convert verbosity count to log level.
    /// 0 = Warn, 1 = Debug, 2+ = Trace
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Warn,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Configuration for the stderr subscriber.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level applied to this crate's events
    pub level: LogLevel,
    /// Level applied to everything else
    pub default_level: LogLevel,
    pub with_timestamps: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            default_level: LogLevel::Warn,
            with_timestamps: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Creates a config with the default levels, timestamps and targets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level for this crate's events.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the level for every other target.
    pub fn with_default_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    /// Enables or disables timestamps.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.with_timestamps = enabled;
        self
    }

    /// Enables or disables the event target.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Create a configuration from verbosity level (0 = warn, 1 = debug, 2+ = trace).
    pub fn from_verbosity(verbosity: u8) -> Self {
        Self::default().with_level(LogLevel::from(verbosity))
    }

    /// Filter directives for this configuration, e.g. `warn,retrywise=trace`.
    pub fn directives(&self) -> String {
        format!(
            "{},{}={}",
            self.default_level.as_str(),
            env!("CARGO_PKG_NAME"),
            self.level.as_str()
        )
    }

    fn env_filter(&self) -> EnvFilter {
        if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.directives())
        }
    }
}

/// Installs a stderr subscriber, failing if one is already set.
pub fn try_init_logging(config: LoggingConfig) -> Result<(), BoxError> {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .with_target(config.with_target);

    if config.with_timestamps {
        subscriber.try_init()
    } else {
        subscriber.without_time().try_init()
    }
}

/// Installs a stderr subscriber unless one is already set.
///
/// # Examples
///
/// ```no_run
/// use retrywise::logging::{init_logging, LoggingConfig, LogLevel};
///
/// init_logging(LoggingConfig::new().with_level(LogLevel::Trace));
/// ```
pub fn init_logging(config: LoggingConfig) {
    if let Err(err) = try_init_logging(config) {
        tracing::debug!(%err, "subscriber already installed");
    }
}
