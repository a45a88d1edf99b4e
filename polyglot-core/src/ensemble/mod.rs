//! Ensemble blending of detector score maps.
//!
//! ## Semantics
//!
//! For a language present in multiple maps, the merged value is the running
//! average of all contributing values — a language seen by only one detector
//! keeps that detector's raw value. Languages missing from a map are treated
//! as absent, not zero, so a language scored by 3 of 5 detectors is averaged
//! over 3 contributions, not penalised for the 2 silent ones.
//!
//! No normalization happens here; that is the weighting stage's job.

use crate::detect::ScoreMap;

/// Merge N detector outputs into one score map by per-language averaging.
///
/// Pure function: no side effects, deterministic for identical inputs.
pub fn blend(score_maps: &[ScoreMap]) -> ScoreMap {
    let mut sums: ScoreMap = ScoreMap::new();
    let mut counts: std::collections::BTreeMap<&str, u32> = std::collections::BTreeMap::new();

    for map in score_maps {
        for (language, score) in map {
            *sums.entry(language.clone()).or_insert(0.0) += score;
            *counts.entry(language.as_str()).or_insert(0) += 1;
        }
    }

    for (language, sum) in sums.iter_mut() {
        let n = counts.get(language.as_str()).copied().unwrap_or(1);
        *sum /= n as f32;
    }
    sums
}
