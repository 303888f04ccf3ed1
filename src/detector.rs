//! Message-text fallback for untyped errors.
//!
//! Errors that cross into the crate without a typed variant or sentinel can
//! only be recognised by their text. The built-in rule is deliberately
//! narrow: a message containing "rate limit" is retryable. Deployments can
//! add their own case-insensitive patterns through
//! [`ClassifierConfig`](crate::ClassifierConfig).
//!
//! This is technical debt. Boundary code should convert foreign errors into
//! typed variants so that nothing depends on message wording.

use regex::{Regex, RegexBuilder};

const RATE_LIMIT_NEEDLE: &str = "rate limit";

/// An extra pattern consulted by the text fallback.
#[derive(Debug, Clone)]
pub struct FallbackPattern {
    regex: Regex,
}

impl FallbackPattern {
    /// Compiles a case-insensitive pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { regex })
    }

    /// Uses a pre-compiled regex as is.
    pub fn with_regex(regex: Regex) -> Self {
        Self { regex }
    }

    /// Returns the compiled regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the regex pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns true if the pattern matches `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Text heuristics applied as the last step of retry classification.
#[derive(Debug, Clone)]
pub struct TextFallback {
    enabled: bool,
    patterns: Vec<FallbackPattern>,
}

impl Default for TextFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFallback {
    /// Creates an enabled fallback with only the built-in rule.
    pub fn new() -> Self {
        Self {
            enabled: true,
            patterns: Vec::new(),
        }
    }

    /// Creates a fallback that never matches.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            patterns: Vec::new(),
        }
    }

    /// Creates an enabled fallback with extra patterns.
    pub fn with_patterns(patterns: Vec<FallbackPattern>) -> Self {
        Self {
            enabled: true,
            patterns,
        }
    }

    /// Adds an extra pattern.
    pub fn add_pattern(&mut self, pattern: FallbackPattern) {
        self.patterns.push(pattern);
    }

    /// Returns true if the fallback step runs.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the extra patterns.
    pub fn patterns(&self) -> &[FallbackPattern] {
        &self.patterns
    }

    /// Returns true if `text` looks like a retryable failure.
    pub fn matches(&self, text: &str) -> bool {
        if !self.enabled {
            return false;
        }
        text.to_lowercase().contains(RATE_LIMIT_NEEDLE)
            || self.patterns.iter().any(|p| p.matches(text))
    }
}
