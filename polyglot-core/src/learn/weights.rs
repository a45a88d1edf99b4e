//! Per-language adaptive weights.
//!
//! Each language carries a multiplicative trust weight in
//! [`WEIGHT_MIN`, `WEIGHT_MAX`], default 1.0. Weights move additively by a
//! learning-rate step on every correction and never change through any other
//! path. Unknown languages lazily initialise to the default — never an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::detect::{LanguageCode, ScoreMap};

/// Lower clamp for any adaptive weight.
pub const WEIGHT_MIN: f32 = 0.5;
/// Upper clamp for any adaptive weight.
pub const WEIGHT_MAX: f32 = 2.0;
/// Weight assumed for a language that has never received a correction.
pub const WEIGHT_DEFAULT: f32 = 1.0;

/// Store of per-language multiplicative weights.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightStore {
    weights: BTreeMap<LanguageCode, f32>,
}

impl WeightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current weight for `language` (default 1.0 if never corrected).
    pub fn get(&self, language: &str) -> f32 {
        self.weights.get(language).copied().unwrap_or(WEIGHT_DEFAULT)
    }

    /// Number of languages with an explicitly stored weight.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Multiply each score by its language weight, then normalize the map to
    /// sum 1.0. If the weighted sum is 0, the input is returned unchanged to
    /// avoid division by zero.
    pub fn apply(&self, scores: &ScoreMap) -> ScoreMap {
        let weighted: ScoreMap = scores
            .iter()
            .map(|(language, score)| (language.clone(), score * self.get(language)))
            .collect();

        let sum: f32 = weighted.values().sum();
        if sum <= 0.0 {
            return scores.clone();
        }

        weighted
            .into_iter()
            .map(|(language, score)| (language, score / sum))
            .collect()
    }

    /// The sole mutation path: raise trust in `correct`, and when the
    /// detection disagreed, lower trust in `detected`. Both clamped.
    pub fn reinforce(&mut self, correct: &str, detected: &str, learning_rate: f32) {
        let up = self.weights.entry(correct.to_string()).or_insert(WEIGHT_DEFAULT);
        *up = (*up + learning_rate).min(WEIGHT_MAX);

        if detected != correct {
            let down = self
                .weights
                .entry(detected.to_string())
                .or_insert(WEIGHT_DEFAULT);
            *down = (*down - learning_rate).max(WEIGHT_MIN);
        }
    }

    /// `true` when every stored weight is inside [`WEIGHT_MIN`, `WEIGHT_MAX`].
    pub fn invariants_hold(&self) -> bool {
        self.weights
            .values()
            .all(|w| (WEIGHT_MIN..=WEIGHT_MAX).contains(w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn map(entries: &[(&str, f32)]) -> ScoreMap {
        entries
            .iter()
            .map(|(code, score)| (code.to_string(), *score))
            .collect()
    }

    #[test]
    fn unknown_language_defaults_to_one() {
        let store = WeightStore::new();
        assert_relative_eq!(store.get("zu"), 1.0);
    }

    #[test]
    fn apply_with_default_weights_normalizes() {
        // {hi:0.5, en:0.3} with all weights 1.0 → {hi:0.625, en:0.375}
        let store = WeightStore::new();
        let out = store.apply(&map(&[("hi", 0.5), ("en", 0.3)]));
        assert_relative_eq!(out["hi"], 0.625, epsilon = 1e-6);
        assert_relative_eq!(out["en"], 0.375, epsilon = 1e-6);
        assert_relative_eq!(out.values().sum::<f32>(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn apply_on_all_zero_map_returns_input_unchanged() {
        let store = WeightStore::new();
        let input = map(&[("hi", 0.0), ("en", 0.0)]);
        assert_eq!(store.apply(&input), input);
    }

    #[test]
    fn apply_on_empty_map_returns_empty() {
        let store = WeightStore::new();
        assert!(store.apply(&ScoreMap::new()).is_empty());
    }

    #[test]
    fn three_reinforcements_accumulate_additively() {
        // (detected="en", correct="hi") × 3 at lr 0.01 → hi=1.03, en=0.97
        let mut store = WeightStore::new();
        for _ in 0..3 {
            store.reinforce("hi", "en", 0.01);
        }
        assert_relative_eq!(store.get("hi"), 1.03, epsilon = 1e-6);
        assert_relative_eq!(store.get("en"), 0.97, epsilon = 1e-6);
    }

    #[test]
    fn agreement_only_raises_the_correct_language() {
        let mut store = WeightStore::new();
        store.reinforce("hi", "hi", 0.05);
        assert_relative_eq!(store.get("hi"), 1.05, epsilon = 1e-6);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn weights_stay_clamped_under_long_correction_runs() {
        let mut store = WeightStore::new();
        for _ in 0..500 {
            store.reinforce("hi", "en", 0.05);
        }
        assert_relative_eq!(store.get("hi"), WEIGHT_MAX);
        assert_relative_eq!(store.get("en"), WEIGHT_MIN);
        assert!(store.invariants_hold());
    }

    #[test]
    fn apply_reflects_learned_weights() {
        let mut store = WeightStore::new();
        for _ in 0..10 {
            store.reinforce("hi", "en", 0.05);
        }
        let out = store.apply(&map(&[("hi", 0.5), ("en", 0.5)]));
        assert!(out["hi"] > out["en"]);
        assert_relative_eq!(out.values().sum::<f32>(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn serde_round_trip_preserves_bounds() {
        let mut store = WeightStore::new();
        store.reinforce("hi", "en", 0.3);
        let json = serde_json::to_string(&store).expect("serialize");
        let back: WeightStore = serde_json::from_str(&json).expect("deserialize");
        assert_relative_eq!(back.get("hi"), store.get("hi"));
        assert!(back.invariants_hold());
    }
}
