//! Staged prediction pass.
//!
//! ## Stages (per prediction)
//!
//! ```text
//! 1. Collect detector score maps (failures omitted, never fatal)
//! 2. Blending        → per-language running average
//! 3. Weighting       → adaptive weights applied, map normalized to 1.0
//! 4. ContextAdjusting → matching contextual patterns nudge their language
//! 5. PatternAdjusting → text-recurrence scores nudge resembling languages
//! 6. Ranked          → highest score wins (ties: lowest language code)
//! ```
//!
//! Each stage is a pure transformation feeding the next; there is no
//! branching or retry, and no store is mutated. The explanation list records
//! how the leading language moved through the stages and is reproducible
//! from identical stores and detector outputs.
//!
//! The two adjustment stages may introduce a language no detector scored:
//! a learned contextual or text pattern is enough to put its language on the
//! candidate list, with the added score bounded by the adjustment factors.
//! This favors languages the user has confirmed but detectors underserve.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::detect::{DetectorHandle, LanguageCode, ScoreMap};
use crate::engine::{EngineConfig, EngineDiagnostics};
use crate::ensemble;
use crate::learn::context::ContextSignature;
use crate::store::EngineSnapshot;

/// Explanation entry emitted when no detector produced any signal (and for
/// empty input text, which short-circuits to the same fallback).
pub const NO_SIGNAL_EXPLANATION: &str = "no detector signal available";

/// Result of one prediction pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub language: LanguageCode,
    /// Final score of the winning language, in [0, 1].
    pub confidence: f32,
    /// Scores of every candidate after all stages.
    pub per_language_scores: ScoreMap,
    /// Per-stage description of how the leading language moved. Purely for
    /// observability; deterministic given identical state and inputs.
    pub explanation: Vec<String>,
}

impl Prediction {
    fn fallback(default_language: &str) -> Self {
        Self {
            language: default_language.to_string(),
            confidence: 0.0,
            per_language_scores: ScoreMap::new(),
            explanation: vec![NO_SIGNAL_EXPLANATION.to_string()],
        }
    }
}

/// Run the full stage sequence over read-only state.
pub(crate) fn run(
    config: &EngineConfig,
    detectors: &[DetectorHandle],
    snapshot: &EngineSnapshot,
    diagnostics: &EngineDiagnostics,
    text: &str,
    context: &ContextSignature,
) -> Prediction {
    if text.trim().is_empty() {
        debug!("empty input text — returning fallback prediction");
        diagnostics.record_fallback();
        return Prediction::fallback(&config.default_language);
    }

    // ── 1. Collect detector signals ───────────────────────────────────────
    let mut maps: Vec<ScoreMap> = Vec::with_capacity(detectors.len());
    for handle in detectors {
        let mut detector = handle.0.lock();
        match detector.detect(text) {
            Ok(scores) if !scores.is_empty() => maps.push(scores),
            Ok(_) => debug!(detector = detector.name(), "detector had no opinion"),
            Err(e) => {
                diagnostics.record_detector_failure();
                warn!(detector = detector.name(), error = %e, "detector failed — omitting its contribution");
            }
        }
    }

    // ── 2. Blending ───────────────────────────────────────────────────────
    let blended = ensemble::blend(&maps);
    if blended.is_empty() {
        diagnostics.record_fallback();
        return Prediction::fallback(&config.default_language);
    }

    let mut explanation = Vec::with_capacity(5);
    if let Some((lang, score)) = leader(&blended) {
        explanation.push(format!(
            "blending: merged {} detector signal(s) across {} language(s); leader {lang} at {score:.3}",
            maps.len(),
            blended.len(),
        ));
    }

    // ── 3. Weighting ──────────────────────────────────────────────────────
    let weighted = snapshot.weights.apply(&blended);
    explanation.push(stage_note("weighting", &blended, &weighted));

    // ── 4. Context adjusting ──────────────────────────────────────────────
    let context_adjusted =
        snapshot
            .contexts
            .adjust(&weighted, context, config.context_adjustment_factor);
    explanation.push(stage_note("context", &weighted, &context_adjusted));

    // ── 5. Pattern adjusting ──────────────────────────────────────────────
    let mut pattern_adjusted = context_adjusted.clone();
    for language in snapshot.patterns.languages() {
        let resemblance = snapshot.patterns.score(text, language);
        if resemblance > 0.0 {
            let entry = pattern_adjusted.entry(language.clone()).or_insert(0.0);
            *entry = (*entry + config.pattern_adjustment_weight * resemblance).min(1.0);
        }
    }
    explanation.push(stage_note("patterns", &context_adjusted, &pattern_adjusted));

    // ── 6. Ranked ─────────────────────────────────────────────────────────
    // Non-empty by construction: blending produced at least one language and
    // no stage removes entries.
    let (language, confidence) = match leader(&pattern_adjusted) {
        Some((lang, score)) => (lang.to_string(), score),
        None => {
            diagnostics.record_fallback();
            return Prediction::fallback(&config.default_language);
        }
    };
    explanation.push(format!(
        "ranked: {language} selected with confidence {confidence:.3}"
    ));

    Prediction {
        language,
        confidence,
        per_language_scores: pattern_adjusted,
        explanation,
    }
}

/// Highest-scored language; ties break toward the lowest language code so
/// the result is deterministic.
fn leader(scores: &ScoreMap) -> Option<(&str, f32)> {
    let mut best: Option<(&str, f32)> = None;
    for (language, &score) in scores {
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((language, score));
        }
    }
    best
}

fn stage_note(label: &str, before: &ScoreMap, after: &ScoreMap) -> String {
    match (leader(before), leader(after)) {
        (Some((was, was_score)), Some((now, now_score))) if was == now => {
            let delta = now_score - was_score;
            format!("{label}: leader {now} {was_score:.3} → {now_score:.3} ({delta:+.3})")
        }
        (Some((was, was_score)), Some((now, now_score))) => {
            format!("{label}: leader changed {was} ({was_score:.3}) → {now} ({now_score:.3})")
        }
        _ => format!("{label}: no candidates"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FixedDetector;
    use crate::learn::context::AmbientNoise;
    use std::time::Duration;

    fn ctx() -> ContextSignature {
        ContextSignature {
            hour_of_day: 10,
            day_of_week: 3,
            previous_language: None,
            session_elapsed: Duration::from_secs(30),
            ambient_noise: AmbientNoise::Quiet,
        }
    }

    fn map(entries: &[(&str, f32)]) -> ScoreMap {
        entries
            .iter()
            .map(|(code, score)| (code.to_string(), *score))
            .collect()
    }

    fn predict_with(detectors: Vec<DetectorHandle>, text: &str) -> Prediction {
        let config = EngineConfig::default();
        let snapshot = EngineSnapshot::empty(config.sample_capacity, config.ledger_capacity);
        let diagnostics = EngineDiagnostics::default();
        run(&config, &detectors, &snapshot, &diagnostics, text, &ctx())
    }

    #[test]
    fn two_detectors_blend_then_normalize() {
        let detectors = vec![
            DetectorHandle::new(FixedDetector::new("a", map(&[("hi", 0.4), ("en", 0.3)]))),
            DetectorHandle::new(FixedDetector::new("b", map(&[("hi", 0.6)]))),
        ];
        let prediction = predict_with(detectors, "namaste duniya");
        assert_eq!(prediction.language, "hi");
        assert!((prediction.confidence - 0.625).abs() < 1e-6);
        assert!((prediction.per_language_scores["en"] - 0.375).abs() < 1e-6);
    }

    #[test]
    fn failing_detector_is_omitted_not_fatal() {
        let detectors = vec![
            DetectorHandle::new(FixedDetector::failing("broken")),
            DetectorHandle::new(FixedDetector::new("ok", map(&[("fr", 0.9)]))),
        ];
        let prediction = predict_with(detectors, "bonjour");
        assert_eq!(prediction.language, "fr");
        assert!((prediction.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn no_signal_falls_back_to_default_language() {
        let prediction = predict_with(vec![DetectorHandle::new(FixedDetector::failing("x"))], "hello");
        assert_eq!(prediction.language, "en");
        assert_eq!(prediction.confidence, 0.0);
        assert_eq!(prediction.explanation, vec![NO_SIGNAL_EXPLANATION.to_string()]);
    }

    #[test]
    fn blank_text_falls_back_without_calling_detectors() {
        let prediction = predict_with(
            vec![DetectorHandle::new(FixedDetector::new(
                "a",
                map(&[("de", 0.8)]),
            ))],
            "   ",
        );
        assert_eq!(prediction.language, "en");
        assert_eq!(prediction.explanation, vec![NO_SIGNAL_EXPLANATION.to_string()]);
    }

    #[test]
    fn explanation_is_deterministic_and_staged() {
        let build = || {
            predict_with(
                vec![DetectorHandle::new(FixedDetector::new(
                    "a",
                    map(&[("hi", 0.5), ("en", 0.3)]),
                ))],
                "namaste",
            )
        };
        let first = build();
        let second = build();
        assert_eq!(first.explanation, second.explanation);
        assert_eq!(first.explanation.len(), 5);
        assert!(first.explanation[0].starts_with("blending:"));
        assert!(first.explanation[1].starts_with("weighting:"));
        assert!(first.explanation[2].starts_with("context:"));
        assert!(first.explanation[3].starts_with("patterns:"));
        assert!(first.explanation[4].starts_with("ranked:"));
    }

    #[test]
    fn leader_tie_breaks_toward_lowest_code() {
        let scores = map(&[("en", 0.5), ("hi", 0.5)]);
        let (language, _) = leader(&scores).expect("non-empty");
        assert_eq!(language, "en");
    }

    #[test]
    fn pattern_stage_can_introduce_a_language_detectors_missed() {
        let config = EngineConfig::default();
        let mut snapshot = EngineSnapshot::empty(config.sample_capacity, config.ledger_capacity);
        snapshot.patterns.absorb("mero naam ram ho", "ne");

        let detectors = vec![DetectorHandle::new(FixedDetector::new(
            "a",
            map(&[("hi", 0.1)]),
        ))];
        let diagnostics = EngineDiagnostics::default();
        let prediction = run(
            &config,
            &detectors,
            &snapshot,
            &diagnostics,
            "mero naam ram ho",
            &ctx(),
        );
        assert!(prediction.per_language_scores.contains_key("ne"));
        assert!(prediction.per_language_scores["ne"] > 0.0);
    }
}
