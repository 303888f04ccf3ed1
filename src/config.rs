//! Classifier configuration.
//!
//! Configuration is optional. When used, it is read from a TOML file and may
//! be overridden from the environment with the `RETRYWISE__` prefix, for
//! example `RETRYWISE__MAX_CHAIN_DEPTH=16` or
//! `RETRYWISE__FALLBACK_PATTERNS="throttled,slow down"`.

use std::path::Path;

use ::config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::chain::DEFAULT_MAX_DEPTH;

/// Errors that can occur when loading classifier configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file path is invalid.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),

    /// The configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] ::config::ConfigError),

    /// A fallback pattern is not a valid regex.
    #[error("invalid fallback pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The chain depth limit must be at least one.
    #[error("max_chain_depth must be at least 1")]
    InvalidDepth,
}

/// Settings for a [`Classifier`](crate::Classifier).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassifierConfig {
    /// Whether message text is consulted as the last retry rule
    #[serde(default = "default_true")]
    pub text_fallback: bool,
    /// Extra case-insensitive regexes that make a message retryable
    #[serde(default)]
    pub fallback_patterns: Vec<String>,
    /// Maximum number of chain nodes visited per check
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            text_fallback: true,
            fallback_patterns: Vec::new(),
            max_chain_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_chain_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl ClassifierConfig {
    /// Load classifier configuration from a TOML file.
    ///
    /// Environment variables with the `RETRYWISE__` prefix override values
    /// from the file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file does not exist
    /// - The configuration file cannot be parsed
    /// - The path is invalid
    /// - The depth limit is zero
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use retrywise::{Classifier, ClassifierConfig};
    ///
    /// let config = ClassifierConfig::load("retrywise.toml")?;
    /// let classifier = Classifier::from_config(&config)?;
    /// # Ok::<(), retrywise::ConfigError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(environment())
            .build()?;

        let classifier_config: ClassifierConfig = config.try_deserialize()?;
        classifier_config.validate()?;

        Ok(classifier_config)
    }

    /// Load classifier configuration from the environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::builder().add_source(environment()).build()?;

        let classifier_config: ClassifierConfig = config.try_deserialize()?;
        classifier_config.validate()?;

        Ok(classifier_config)
    }

    /// Checks values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chain_depth == 0 {
            return Err(ConfigError::InvalidDepth);
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix("RETRYWISE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("fallback_patterns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::default();
        assert!(config.text_fallback);
        assert!(config.fallback_patterns.is_empty());
        assert_eq!(config.max_chain_depth, 64);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ClassifierConfig = toml::from_str(
            r#"
            fallback_patterns = ["throttl", "try again later"]
            "#,
        )
        .unwrap();

        assert!(config.text_fallback);
        assert_eq!(config.fallback_patterns.len(), 2);
        assert_eq!(config.max_chain_depth, 64);
    }

    #[test]
    fn test_load_file_not_found() {
        let result = ClassifierConfig::load("nonexistent/path/retrywise.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "text_fallback = false").unwrap();
        writeln!(file, "max_chain_depth = 12").unwrap();

        let config = ClassifierConfig::load(file.path()).unwrap();
        assert!(!config.text_fallback);
        assert_eq!(config.max_chain_depth, 12);
    }

    #[test]
    fn test_load_rejects_zero_depth() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_chain_depth = 0").unwrap();

        let result = ClassifierConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidDepth)));
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_chain_depth = = 3").unwrap();

        let result = ClassifierConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::FileNotFound("retrywise.toml".to_string());
        assert_eq!(err.to_string(), "configuration file not found: retrywise.toml");

        let err = ConfigError::InvalidDepth;
        assert_eq!(err.to_string(), "max_chain_depth must be at least 1");
    }
}
