//! `FixedDetector` — deterministic detector backend for tests and demos.
//!
//! Returns the same score map for every input, which lets the full
//! blend → weight → adjust → rank path be exercised without any real
//! detection model attached.

use tracing::debug;

use crate::detect::{LanguageDetector, ScoreMap};
use crate::error::{PolyglotError, Result};

/// Detector that answers every query with a fixed score map.
pub struct FixedDetector {
    name: String,
    scores: ScoreMap,
    fail: bool,
}

impl FixedDetector {
    pub fn new(name: impl Into<String>, scores: ScoreMap) -> Self {
        Self {
            name: name.into(),
            scores,
            fail: false,
        }
    }

    /// A detector that always errors, for exercising the omit-on-failure path.
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scores: ScoreMap::new(),
            fail: true,
        }
    }
}

impl LanguageDetector for FixedDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&mut self, text: &str) -> Result<ScoreMap> {
        if self.fail {
            return Err(PolyglotError::Detector(format!(
                "{}: intentional failure",
                self.name
            )));
        }
        debug!(detector = %self.name, chars = text.chars().count(), "fixed detect");
        Ok(self.scores.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_configured_scores() {
        let mut detector =
            FixedDetector::new("script", ScoreMap::from([("hi".to_string(), 0.4)]));
        let scores = detector.detect("नमस्ते").expect("detect");
        assert_eq!(scores.get("hi"), Some(&0.4));
    }

    #[test]
    fn failing_detector_errors() {
        let mut detector = FixedDetector::failing("broken");
        assert!(detector.detect("hello").is_err());
    }
}
