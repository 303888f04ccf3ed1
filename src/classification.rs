//! Retry classification engine.
//!
//! Four independent policies answer what a caller should do with an error:
//! retry it, treat it as a transient blip, give up on it, or retry a timeout.
//! They are not complements of each other, and an error can be neither
//! transient nor permanent.

use std::error::Error;
use std::sync::OnceLock;

use serde::Serialize;

use crate::chain::{Chain, DEFAULT_MAX_DEPTH};
use crate::config::{ClassifierConfig, ConfigError};
use crate::detector::{FallbackPattern, TextFallback};
use crate::inspect::{is_cancel_node, is_connectivity_node, is_deadline_node};
use crate::retryable;
use crate::sentinel::{self, Sentinel, CIRCUIT_OPEN, NETWORK_TIMEOUT};
use crate::variants::{HttpError, NetworkError, ProcessingError, TimeoutError, ValidationError};
use crate::Retryable;

static DEFAULT_CLASSIFIER: OnceLock<Classifier> = OnceLock::new();

/// Applies the classification policies to error chains.
#[derive(Debug, Clone)]
pub struct Classifier {
    fallback: TextFallback,
    max_depth: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    /// Creates a classifier with the built-in text fallback and the default
    /// chain depth limit.
    pub fn new() -> Self {
        Self {
            fallback: TextFallback::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Builds a classifier from configuration, compiling its extra patterns.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let fallback = if config.text_fallback {
            let patterns = config
                .fallback_patterns
                .iter()
                .map(|p| FallbackPattern::new(p))
                .collect::<Result<Vec<_>, _>>()?;
            TextFallback::with_patterns(patterns)
        } else {
            TextFallback::disabled()
        };

        Ok(Self {
            fallback,
            max_depth: config.max_chain_depth,
        })
    }

    /// Replaces the text fallback.
    pub fn with_fallback(mut self, fallback: TextFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sets the chain depth limit. Values below 1 are raised to 1.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Returns the text fallback.
    pub fn fallback(&self) -> &TextFallback {
        &self.fallback
    }

    /// Returns the chain depth limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn nodes<'a>(&self, err: &'a (dyn Error + 'static)) -> Chain<'a> {
        Chain::with_limit(err, self.max_depth)
    }

    fn contains(&self, err: &(dyn Error + 'static), sentinels: &[&'static Sentinel]) -> bool {
        self.nodes(err)
            .any(|node| sentinels.iter().any(|s| s.matches(node)))
    }

    fn find<'a, T: Error + 'static>(&self, err: &'a (dyn Error + 'static)) -> Option<&'a T> {
        self.nodes(err).find_map(|node| node.downcast_ref::<T>())
    }

    /// A processing error defers to its cause, which is judged by this
    /// classifier's rules rather than the default's.
    fn self_reported(&self, node: &(dyn Error + 'static)) -> Option<bool> {
        match node.downcast_ref::<ProcessingError>() {
            Some(processing) => Some(
                processing.retryable_flag()
                    || processing
                        .cause()
                        .is_some_and(|cause| self.is_retryable(cause)),
            ),
            None => retryable::self_reported(node),
        }
    }

    fn abandoned(&self, err: &(dyn Error + 'static)) -> bool {
        self.nodes(err)
            .any(|node| is_deadline_node(node) || is_cancel_node(node))
    }

    /// Decides whether the failed operation should be retried.
    ///
    /// Checks run in a fixed order and the first that applies decides:
    ///
    /// 1. a passed deadline or a cancellation anywhere in the chain: `false`
    /// 2. the nearest node that reports its own retryability: its answer
    /// 3. a retryable sentinel in the chain: `true`
    /// 4. an [`HttpError`] in the chain: its status verdict
    /// 5. a node message matching the text fallback: `true`
    /// 6. otherwise `false`
    pub fn is_retryable(&self, err: &(dyn Error + 'static)) -> bool {
        if self.abandoned(err) {
            tracing::trace!(step = "context", verdict = false, "classified retryability");
            return false;
        }

        if let Some(verdict) = self.nodes(err).find_map(|node| self.self_reported(node)) {
            tracing::trace!(step = "self_reported", verdict, "classified retryability");
            return verdict;
        }

        if self.contains(err, &sentinel::RETRYABLE) {
            tracing::trace!(step = "sentinel", verdict = true, "classified retryability");
            return true;
        }

        if let Some(http) = self.find::<HttpError>(err) {
            let verdict = http.is_retryable();
            tracing::trace!(step = "http_status", verdict, "classified retryability");
            return verdict;
        }

        if self.fallback.is_enabled()
            && self
                .nodes(err)
                .any(|node| self.fallback.matches(&node.to_string()))
        {
            tracing::trace!(step = "text_fallback", verdict = true, "classified retryability");
            return true;
        }

        false
    }

    /// Decides whether a timeout is worth retrying.
    ///
    /// A passed deadline is final. Cancellation alone does not decide this
    /// check.
    pub fn is_retryable_timeout(&self, err: &(dyn Error + 'static)) -> bool {
        if self.nodes(err).any(is_deadline_node) {
            return false;
        }
        if let Some(timeout) = self.find::<TimeoutError>(err) {
            return timeout.is_retryable();
        }
        self.contains(err, &[&NETWORK_TIMEOUT])
    }

    /// Decides whether the failure is a transient condition.
    pub fn is_transient_error(&self, err: &(dyn Error + 'static)) -> bool {
        if self.abandoned(err) {
            return false;
        }

        match self.find::<NetworkError>(err) {
            Some(network) if network.is_transient() => return true,
            Some(_) => {}
            None => {
                if self.nodes(err).any(is_connectivity_node) {
                    return true;
                }
            }
        }

        self.contains(err, &sentinel::TRANSIENT)
    }

    /// Decides whether the failure can never succeed on retry.
    pub fn is_permanent_error(&self, err: &(dyn Error + 'static)) -> bool {
        if self.find::<ValidationError>(err).is_some() {
            return true;
        }
        if self.abandoned(err) {
            return true;
        }
        if self.contains(err, &[&CIRCUIT_OPEN]) {
            return true;
        }
        self.find::<HttpError>(err)
            .is_some_and(HttpError::is_client_error)
    }

    /// Runs all four policies. An absent error is all `false`.
    pub fn classify(&self, err: Option<&(dyn Error + 'static)>) -> Classification {
        let Some(err) = err else {
            return Classification::default();
        };
        let classification = Classification {
            retryable: self.is_retryable(err),
            transient: self.is_transient_error(err),
            permanent: self.is_permanent_error(err),
            retryable_timeout: self.is_retryable_timeout(err),
        };
        tracing::debug!(
            error = %err,
            retryable = classification.retryable,
            transient = classification.transient,
            permanent = classification.permanent,
            retryable_timeout = classification.retryable_timeout,
            "classified error"
        );
        classification
    }
}

/// The four verdicts for one error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub retryable: bool,
    pub transient: bool,
    pub permanent: bool,
    pub retryable_timeout: bool,
}

impl Classification {
    /// Classifies `err` with the default classifier.
    pub fn of(err: Option<&(dyn Error + 'static)>) -> Self {
        default_classifier().classify(err)
    }
}

/// Classifies the error of a result. `Ok` is all `false`.
pub fn classify_result<T, E: Error + 'static>(result: &Result<T, E>) -> Classification {
    Classification::of(result.as_ref().err().map(|e| e as &(dyn Error + 'static)))
}

/// The process-wide classifier used by the free functions.
pub fn default_classifier() -> &'static Classifier {
    DEFAULT_CLASSIFIER.get_or_init(Classifier::new)
}

/// Installs the process-wide classifier.
///
/// Only the first call before any classification takes effect; later calls
/// return the rejected classifier.
pub fn install_default(classifier: Classifier) -> Result<(), Classifier> {
    DEFAULT_CLASSIFIER.set(classifier)
}

/// Returns true if the failed operation should be retried.
///
/// See [`Classifier::is_retryable`] for the rules.
pub fn is_retryable(err: &(dyn Error + 'static)) -> bool {
    default_classifier().is_retryable(err)
}

/// Returns true if a timeout is worth retrying.
pub fn is_retryable_timeout(err: &(dyn Error + 'static)) -> bool {
    default_classifier().is_retryable_timeout(err)
}

/// Returns true if the failure is a transient condition.
pub fn is_transient_error(err: &(dyn Error + 'static)) -> bool {
    default_classifier().is_transient_error(err)
}

/// Returns true if the failure can never succeed on retry.
pub fn is_permanent_error(err: &(dyn Error + 'static)) -> bool {
    default_classifier().is_permanent_error(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::wrap;
    use crate::sentinel::{CANCELED, DEADLINE_EXCEEDED, DEADLOCK, RATE_LIMITED};
    use std::time::Duration;

    #[derive(Debug)]
    struct Plain(&'static str);

    impl std::fmt::Display for Plain {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Error for Plain {}

    #[test]
    fn test_context_overrides_self_report() {
        let err = TimeoutError::new("op timed out", "Fetch", Duration::from_secs(30))
            .with_cause(&DEADLINE_EXCEEDED);
        let classifier = Classifier::new();

        assert!(!classifier.is_retryable(&err));
        assert!(classifier.is_permanent_error(&err));
        assert!(!classifier.is_retryable_timeout(&err));
        assert!(!classifier.is_transient_error(&err));
    }

    #[test]
    fn test_cancel_does_not_decide_timeout_check() {
        let err = TimeoutError::new("slow", "Fetch", Duration::from_secs(1)).with_cause(&CANCELED);
        let classifier = Classifier::new();

        assert!(!classifier.is_retryable(&err));
        assert!(classifier.is_retryable_timeout(&err));
    }

    #[test]
    fn test_retryable_timeout_sentinel() {
        let classifier = Classifier::new();
        assert!(classifier.is_retryable_timeout(&*wrap(&NETWORK_TIMEOUT, "dial")));
        assert!(!classifier.is_retryable_timeout(&RATE_LIMITED));
    }

    #[test]
    fn test_text_fallback_can_be_disabled() {
        let err = Plain("upstream rate limit hit");

        assert!(Classifier::new().is_retryable(&err));
        assert!(!Classifier::new()
            .with_fallback(TextFallback::disabled())
            .is_retryable(&err));
    }

    #[test]
    fn test_text_fallback_checks_inner_messages() {
        let err = wrap(Plain("Rate limit exceeded"), "listing repositories");
        assert!(Classifier::new().is_retryable(&*err));
    }

    #[test]
    fn test_from_config_patterns() {
        let config = ClassifierConfig {
            fallback_patterns: vec!["slow down".to_string()],
            ..ClassifierConfig::default()
        };
        let classifier = Classifier::from_config(&config).expect("valid config");

        assert!(classifier.is_retryable(&Plain("please SLOW DOWN")));
        assert!(!Classifier::new().is_retryable(&Plain("please SLOW DOWN")));
    }

    #[test]
    fn test_from_config_rejects_bad_pattern() {
        let config = ClassifierConfig {
            fallback_patterns: vec!["[".to_string()],
            ..ClassifierConfig::default()
        };
        assert!(matches!(
            Classifier::from_config(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_from_config_disabled_fallback() {
        let config = ClassifierConfig {
            text_fallback: false,
            max_chain_depth: 8,
            ..ClassifierConfig::default()
        };
        let classifier = Classifier::from_config(&config).expect("valid config");

        assert!(!classifier.fallback().is_enabled());
        assert_eq!(classifier.max_depth(), 8);
    }

    #[test]
    fn test_depth_limit_hides_deep_sentinel() {
        let err = wrap(wrap(wrap(&DEADLOCK, "a"), "b"), "c");

        assert!(Classifier::new().is_transient_error(&*err));
        assert!(!Classifier::new().with_max_depth(2).is_transient_error(&*err));
    }

    #[test]
    fn test_zero_depth_is_raised_to_one() {
        let classifier = Classifier::new().with_max_depth(0);

        assert_eq!(classifier.max_depth(), 1);
        assert!(classifier.is_retryable(&HttpError::new(503, "unavailable")));
    }

    #[test]
    fn test_processing_cause_uses_active_fallback() {
        let classifier = Classifier::new().with_fallback(TextFallback::disabled());
        let bare = crate::chain::new("upstream rate limit hit");
        let wrapped = ProcessingError::new("import failed", "Ingest")
            .with_cause("upstream rate limit hit");

        assert!(!classifier.is_retryable(&*bare));
        assert!(!classifier.is_retryable(&wrapped));
        assert!(Classifier::new().is_retryable(&wrapped));
    }

    #[test]
    fn test_processing_cause_uses_active_patterns() {
        let config = ClassifierConfig {
            fallback_patterns: vec!["throttled".to_string()],
            ..ClassifierConfig::default()
        };
        let classifier = Classifier::from_config(&config).expect("valid config");
        let err = wrap(
            ProcessingError::new("sync failed", "Push").with_cause("request throttled"),
            "nightly sync",
        );

        assert!(classifier.is_retryable(&*err));
        assert!(!Classifier::new().is_retryable(&*err));
    }

    #[test]
    fn test_processing_flag_wins_over_cause() {
        let classifier = Classifier::new().with_fallback(TextFallback::disabled());
        let err = ProcessingError::retryable("import failed", "Ingest")
            .with_cause(ValidationError::new("bad row", "id"));

        assert!(classifier.is_retryable(&err));
    }

    #[test]
    fn test_classify_none_is_all_false() {
        assert_eq!(Classifier::new().classify(None), Classification::default());
        assert_eq!(classify_result::<(), Plain>(&Ok(())), Classification::default());
    }

    #[test]
    fn test_classify_result_err() {
        let result: Result<(), HttpError> = Err(HttpError::new(400, "bad request"));
        let classification = classify_result(&result);

        assert!(!classification.retryable);
        assert!(classification.permanent);
        assert!(!classification.transient);
        assert!(!classification.retryable_timeout);
    }

    #[test]
    fn test_classification_serializes() {
        let node: &(dyn Error + 'static) = &DEADLOCK;
        let classification = Classifier::new().classify(Some(node));
        let json = serde_json::to_value(classification).expect("serializable");

        assert_eq!(json["retryable"], true);
        assert_eq!(json["transient"], true);
        assert_eq!(json["permanent"], false);
    }
}
