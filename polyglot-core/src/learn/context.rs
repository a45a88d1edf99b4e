//! Situational context patterns.
//!
//! A `ContextualPattern` associates a context signature (time of day, day of
//! week, previous language, session age, ambient noise) with a preferred
//! language. Matching is an intentionally loose OR of three conditions — a
//! recall-favoring heuristic whose false positives are bounded by each
//! pattern's `strength`, not a precise classifier.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detect::{LanguageCode, ScoreMap};

/// Strength assigned to a freshly created contextual pattern.
const STRENGTH_INITIAL: f32 = 1.0;
/// Strength added per reinforcing correction.
const STRENGTH_STEP: f32 = 0.1;
/// Upper clamp for any pattern strength.
pub const STRENGTH_MAX: f32 = 2.0;
/// Hours of circular distance within which two hours-of-day match.
const HOUR_TOLERANCE: u32 = 2;

/// Coarse ambient noise classification supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmbientNoise {
    Quiet,
    Moderate,
    Noisy,
    VeryNoisy,
}

/// Situational context captured alongside each prediction and correction.
///
/// Value type; two signatures are compared by [`ContextSignature::matches`],
/// never by equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSignature {
    /// 0..=23.
    pub hour_of_day: u32,
    /// 1..=7.
    pub day_of_week: u32,
    /// Language of the previous utterance, if any. A hint assembled by the
    /// caller from earlier results — never trusted as ground truth.
    pub previous_language: Option<LanguageCode>,
    pub session_elapsed: Duration,
    pub ambient_noise: AmbientNoise,
}

impl ContextSignature {
    /// Loose OR-based match: hour-of-day within ±2 circularly, OR identical
    /// day-of-week, OR identical non-null previous language.
    pub fn matches(&self, other: &ContextSignature) -> bool {
        circular_hour_distance(self.hour_of_day, other.hour_of_day) <= HOUR_TOLERANCE
            || self.day_of_week == other.day_of_week
            || (self.previous_language.is_some()
                && self.previous_language == other.previous_language)
    }
}

fn circular_hour_distance(a: u32, b: u32) -> u32 {
    let diff = a.abs_diff(b) % 24;
    diff.min(24 - diff)
}

/// A learned association between a context and a preferred language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualPattern {
    pub context: ContextSignature,
    pub preferred_language: LanguageCode,
    /// Reinforced on each matching correction, in [0, `STRENGTH_MAX`].
    pub strength: f32,
}

/// Store of contextual patterns built from corrections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextStore {
    patterns: Vec<ContextualPattern>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Every stored pattern whose signature matches `signature`.
    pub fn matching(&self, signature: &ContextSignature) -> Vec<&ContextualPattern> {
        self.patterns
            .iter()
            .filter(|p| p.context.matches(signature))
            .collect()
    }

    /// Nudge each matching pattern's preferred language upward by
    /// `strength * adjustment_factor`, capping every score at 1.0.
    ///
    /// A preferred language absent from `scores` is inserted at the nudge
    /// value. This is deliberate: a language every detector missed can still
    /// surface as a candidate when the situation has repeatedly favored it,
    /// and its score stays bounded by `strength * adjustment_factor`.
    pub fn adjust(
        &self,
        scores: &ScoreMap,
        signature: &ContextSignature,
        adjustment_factor: f32,
    ) -> ScoreMap {
        let mut adjusted = scores.clone();
        for pattern in self.matching(signature) {
            let entry = adjusted
                .entry(pattern.preferred_language.clone())
                .or_insert(0.0);
            *entry = (*entry + pattern.strength * adjustment_factor).min(1.0);
        }
        adjusted
    }

    /// Reinforce an existing matching pattern for the same preferred
    /// language, or create a new one at initial strength.
    pub fn record_or_reinforce(&mut self, signature: &ContextSignature, preferred: &str) {
        for pattern in &mut self.patterns {
            if pattern.preferred_language == preferred && pattern.context.matches(signature) {
                pattern.strength = (pattern.strength + STRENGTH_STEP).min(STRENGTH_MAX);
                return;
            }
        }
        self.patterns.push(ContextualPattern {
            context: signature.clone(),
            preferred_language: preferred.to_string(),
            strength: STRENGTH_INITIAL,
        });
    }

    /// `true` when every strength is inside [0, `STRENGTH_MAX`].
    pub fn invariants_hold(&self) -> bool {
        self.patterns
            .iter()
            .all(|p| (0.0..=STRENGTH_MAX).contains(&p.strength))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn signature(hour: u32, day: u32, previous: Option<&str>) -> ContextSignature {
        ContextSignature {
            hour_of_day: hour,
            day_of_week: day,
            previous_language: previous.map(str::to_string),
            session_elapsed: Duration::from_secs(120),
            ambient_noise: AmbientNoise::Quiet,
        }
    }

    #[test]
    fn hour_match_is_circular() {
        // 23:00 and 01:00 are 2 hours apart across midnight.
        assert!(signature(23, 1, None).matches(&signature(1, 4, None)));
        assert!(!signature(12, 1, None).matches(&signature(18, 4, None)));
    }

    #[test]
    fn same_day_matches_regardless_of_hour() {
        assert!(signature(3, 5, None).matches(&signature(15, 5, None)));
    }

    #[test]
    fn previous_language_matches_only_when_non_null() {
        assert!(signature(3, 1, Some("hi")).matches(&signature(15, 4, Some("hi"))));
        // Both None must NOT count as a previous-language match.
        assert!(!signature(3, 1, None).matches(&signature(15, 4, None)));
    }

    #[test]
    fn record_then_reinforce_increments_strength_capped() {
        let mut store = ContextStore::new();
        let ctx = signature(9, 2, Some("hi"));
        store.record_or_reinforce(&ctx, "hi");
        assert_eq!(store.len(), 1);

        for _ in 0..30 {
            store.record_or_reinforce(&ctx, "hi");
        }
        assert_eq!(store.len(), 1);
        assert_relative_eq!(store.matching(&ctx)[0].strength, STRENGTH_MAX);
        assert!(store.invariants_hold());
    }

    #[test]
    fn different_preferred_language_creates_a_new_pattern() {
        let mut store = ContextStore::new();
        let ctx = signature(9, 2, None);
        store.record_or_reinforce(&ctx, "hi");
        store.record_or_reinforce(&ctx, "en");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn adjust_nudges_preferred_language_and_caps_at_one() {
        let mut store = ContextStore::new();
        let ctx = signature(9, 2, None);
        store.record_or_reinforce(&ctx, "hi");

        let scores = ScoreMap::from([("hi".to_string(), 0.4), ("en".to_string(), 0.6)]);
        let adjusted = store.adjust(&scores, &ctx, 0.05);
        assert_relative_eq!(adjusted["hi"], 0.45, epsilon = 1e-6);
        assert_relative_eq!(adjusted["en"], 0.6, epsilon = 1e-6);

        let near_cap = ScoreMap::from([("hi".to_string(), 0.99)]);
        let capped = store.adjust(&near_cap, &ctx, 0.5);
        assert_relative_eq!(capped["hi"], 1.0);
    }

    #[test]
    fn adjust_introduces_absent_preferred_language() {
        let mut store = ContextStore::new();
        let ctx = signature(9, 2, None);
        store.record_or_reinforce(&ctx, "ne");
        let adjusted = store.adjust(&ScoreMap::new(), &ctx, 0.05);
        assert_relative_eq!(adjusted["ne"], 0.05, epsilon = 1e-6);
    }

    #[test]
    fn non_matching_context_leaves_scores_untouched() {
        let mut store = ContextStore::new();
        store.record_or_reinforce(&signature(3, 1, Some("hi")), "hi");
        let scores = ScoreMap::from([("en".to_string(), 0.5)]);
        let adjusted = store.adjust(&scores, &signature(15, 4, None), 0.05);
        assert_eq!(adjusted, scores);
    }
}
