//! Bounded correction ledger.
//!
//! Append-only FIFO log of every user correction, capped at a configured
//! capacity (oldest evicted first). The ledger is the system of record for
//! accuracy-trend statistics; the dependent stores (patterns, context,
//! weights) are updated by the engine in lockstep with each append.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detect::LanguageCode;
use crate::learn::context::ContextSignature;

/// One user-submitted ground-truth override. Immutable once created; the
/// ledger owns the original and consumers receive clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub text: String,
    pub detected_language: LanguageCode,
    pub correct_language: LanguageCode,
    /// Engine confidence at the time of the wrong (or right) detection.
    pub original_confidence: f32,
    pub timestamp: DateTime<Utc>,
    pub context: ContextSignature,
    pub text_length: usize,
    pub word_count: usize,
}

impl Correction {
    pub fn new(
        text: impl Into<String>,
        detected_language: impl Into<LanguageCode>,
        correct_language: impl Into<LanguageCode>,
        original_confidence: f32,
        context: ContextSignature,
    ) -> Self {
        let text = text.into();
        let text_length = text.chars().count();
        let word_count = text.split_whitespace().count();
        Self {
            text,
            detected_language: detected_language.into(),
            correct_language: correct_language.into(),
            original_confidence,
            timestamp: Utc::now(),
            context,
            text_length,
            word_count,
        }
    }

    /// Whether the detection already agreed with the user.
    pub fn was_agreement(&self) -> bool {
        self.detected_language == self.correct_language
    }
}

/// Size-bounded FIFO log of corrections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionLedger {
    entries: VecDeque<Correction>,
    capacity: usize,
    /// Lifetime count of recorded corrections; unlike `entries.len()` this
    /// keeps growing past capacity and drives the retrain-due signal.
    lifetime: u64,
}

impl CorrectionLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            lifetime: 0,
        }
    }

    /// Re-bound the ledger, evicting oldest entries past the new capacity.
    /// Persisted snapshots carry the capacity they were saved under; the
    /// configured capacity wins when they disagree.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Append a correction, evicting the oldest entry at capacity.
    pub fn record(&mut self, correction: Correction) {
        self.entries.push_back(correction);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.lifetime += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lifetime_total(&self) -> u64 {
        self.lifetime
    }

    /// Oldest-first view of the retained corrections.
    pub fn iter(&self) -> impl Iterator<Item = &Correction> {
        self.entries.iter()
    }

    /// Rolling accuracy trend: agreement rate over the most recent window of
    /// corrections minus the rate over the window immediately preceding it.
    /// Positive means detections have been agreeing with the user more often
    /// lately. When fewer than `2 * window` corrections are retained, the
    /// comparison window shrinks to half the ledger so an early trend is
    /// still reported; with fewer than two corrections there is nothing to
    /// compare and the trend is 0.0.
    pub fn accuracy_trend(&self, window: usize) -> f32 {
        let w = window.min(self.entries.len() / 2);
        if w == 0 {
            return 0.0;
        }

        let recent_rate = self.agreement_rate(self.entries.len() - w, self.entries.len());
        let previous_rate = self.agreement_rate(self.entries.len() - 2 * w, self.entries.len() - w);
        recent_rate - previous_rate
    }

    fn agreement_rate(&self, start: usize, end: usize) -> f32 {
        let span = end - start;
        if span == 0 {
            return 0.0;
        }
        let agreements = self
            .entries
            .range(start..end)
            .filter(|c| c.was_agreement())
            .count();
        agreements as f32 / span as f32
    }

    /// `true` when the retained entries respect the capacity bound.
    pub fn invariants_hold(&self) -> bool {
        self.entries.len() <= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learn::context::AmbientNoise;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn ctx() -> ContextSignature {
        ContextSignature {
            hour_of_day: 10,
            day_of_week: 3,
            previous_language: None,
            session_elapsed: Duration::from_secs(60),
            ambient_noise: AmbientNoise::Moderate,
        }
    }

    fn correction(detected: &str, correct: &str) -> Correction {
        Correction::new("sample text", detected, correct, 0.8, ctx())
    }

    #[test]
    fn new_correction_derives_text_metrics() {
        let c = Correction::new("dos palabras aquí", "en", "es", 0.5, ctx());
        assert_eq!(c.word_count, 3);
        assert_eq!(c.text_length, 17);
        assert!(!c.was_agreement());
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut ledger = CorrectionLedger::new(3);
        for i in 0..4 {
            let mut c = correction("en", "hi");
            c.text = format!("utterance {i}");
            ledger.record(c);
        }
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.lifetime_total(), 4);
        let texts: Vec<_> = ledger.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["utterance 1", "utterance 2", "utterance 3"]);
        assert!(ledger.invariants_hold());
    }

    #[test]
    fn shrinking_capacity_evicts_oldest_retained_entries() {
        let mut ledger = CorrectionLedger::new(5);
        for i in 0..5 {
            let mut c = correction("en", "hi");
            c.text = format!("utterance {i}");
            ledger.record(c);
        }

        ledger.set_capacity(2);
        assert_eq!(ledger.len(), 2);
        let texts: Vec<_> = ledger.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["utterance 3", "utterance 4"]);
        assert!(ledger.invariants_hold());
        // Lifetime count is history, not retention; it survives the re-bound.
        assert_eq!(ledger.lifetime_total(), 5);
    }

    #[test]
    fn trend_is_zero_with_fewer_than_two_entries() {
        let mut ledger = CorrectionLedger::new(100);
        assert_relative_eq!(ledger.accuracy_trend(10), 0.0);
        ledger.record(correction("en", "hi"));
        assert_relative_eq!(ledger.accuracy_trend(10), 0.0);
    }

    #[test]
    fn improving_agreement_yields_positive_trend() {
        let mut ledger = CorrectionLedger::new(100);
        // Older window: all disagreements. Recent window: all agreements.
        for _ in 0..5 {
            ledger.record(correction("en", "hi"));
        }
        for _ in 0..5 {
            ledger.record(correction("hi", "hi"));
        }
        assert_relative_eq!(ledger.accuracy_trend(5), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn worsening_agreement_yields_negative_trend() {
        let mut ledger = CorrectionLedger::new(100);
        for _ in 0..4 {
            ledger.record(correction("hi", "hi"));
        }
        for _ in 0..4 {
            ledger.record(correction("en", "hi"));
        }
        assert_relative_eq!(ledger.accuracy_trend(4), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn window_shrinks_when_ledger_is_small() {
        let mut ledger = CorrectionLedger::new(100);
        ledger.record(correction("en", "hi"));
        ledger.record(correction("hi", "hi"));
        // Window of 10 requested, only 2 entries → compare 1 vs 1.
        assert_relative_eq!(ledger.accuracy_trend(10), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn serde_round_trip_preserves_order_and_lifetime() {
        let mut ledger = CorrectionLedger::new(2);
        for i in 0..3 {
            let mut c = correction("en", "hi");
            c.text = format!("t{i}");
            ledger.record(c);
        }
        let json = serde_json::to_string(&ledger).expect("serialize");
        let back: CorrectionLedger = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.len(), 2);
        assert_eq!(back.lifetime_total(), 3);
        let texts: Vec<_> = back.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["t1", "t2"]);
        assert!(back.invariants_hold());
    }
}
