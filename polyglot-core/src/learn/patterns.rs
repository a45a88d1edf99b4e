//! Per-language text-pattern library.
//!
//! A deliberately cheap, explainable heuristic rather than a trained
//! classifier: it rewards literal recurrence of the user's own vocabulary
//! and script, which matters most for low-resource languages where
//! general-purpose detectors are weakest.
//!
//! One `LanguagePattern` exists per language that has ever received a
//! correction. Patterns only grow (capped sample list aside); they shrink
//! only on a full engine reset.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::detect::LanguageCode;

/// Score contribution per character of input already seen for the language.
const CHAR_HIT_INCREMENT: f32 = 0.01;
/// Score contribution per input token found in the language's common words.
const WORD_HIT_INCREMENT: f32 = 0.1;
/// Tokens this short carry no signal and are not absorbed.
const MIN_WORD_LEN: usize = 3;

/// Accumulated text knowledge for a single language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagePattern {
    pub language_code: LanguageCode,
    /// Confirmed-correct samples, oldest first, FIFO-evicted at capacity.
    pub sample_texts: VecDeque<String>,
    /// Count of every character ever absorbed for this language.
    pub character_frequency: BTreeMap<char, u32>,
    /// Case-folded tokens (length > 2) from absorbed samples.
    pub common_words: BTreeSet<String>,
}

impl LanguagePattern {
    fn new(language_code: LanguageCode) -> Self {
        Self {
            language_code,
            sample_texts: VecDeque::new(),
            character_frequency: BTreeMap::new(),
            common_words: BTreeSet::new(),
        }
    }
}

/// Library of `LanguagePattern`s keyed by language code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternLibrary {
    patterns: BTreeMap<LanguageCode, LanguagePattern>,
    /// Maximum retained samples per language.
    sample_capacity: usize,
}

impl PatternLibrary {
    pub fn new(sample_capacity: usize) -> Self {
        Self {
            patterns: BTreeMap::new(),
            sample_capacity,
        }
    }

    /// Re-bound every sample list, evicting oldest samples past the new
    /// capacity. Persisted snapshots carry the capacity they were saved
    /// under; the configured capacity wins when they disagree.
    pub fn set_sample_capacity(&mut self, capacity: usize) {
        self.sample_capacity = capacity;
        for pattern in self.patterns.values_mut() {
            while pattern.sample_texts.len() > capacity {
                pattern.sample_texts.pop_front();
            }
        }
    }

    /// Number of languages with learned patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, language: &str) -> Option<&LanguagePattern> {
        self.patterns.get(language)
    }

    /// Languages that have at least one learned pattern, in code order.
    pub fn languages(&self) -> impl Iterator<Item = &LanguageCode> {
        self.patterns.keys()
    }

    /// Resemblance of `text` to previously absorbed samples for `language`,
    /// in [0, 1]. Unknown languages score 0.
    pub fn score(&self, text: &str, language: &str) -> f32 {
        let Some(pattern) = self.patterns.get(language) else {
            return 0.0;
        };

        let mut score = 0.0f32;
        for ch in text.chars() {
            if pattern.character_frequency.contains_key(&ch) {
                score += CHAR_HIT_INCREMENT;
            }
        }
        for token in text.split_whitespace() {
            if pattern.common_words.contains(&token.to_lowercase()) {
                score += WORD_HIT_INCREMENT;
            }
        }
        score.min(1.0)
    }

    /// Fold a confirmed-correct sample into the language's pattern.
    pub fn absorb(&mut self, text: &str, language: &str) {
        let pattern = self
            .patterns
            .entry(language.to_string())
            .or_insert_with(|| LanguagePattern::new(language.to_string()));

        pattern.sample_texts.push_back(text.to_string());
        while pattern.sample_texts.len() > self.sample_capacity {
            pattern.sample_texts.pop_front();
        }

        for ch in text.chars() {
            *pattern.character_frequency.entry(ch).or_insert(0) += 1;
        }
        for token in text.split_whitespace() {
            if token.chars().count() >= MIN_WORD_LEN {
                pattern.common_words.insert(token.to_lowercase());
            }
        }
    }

    /// `true` when no sample list exceeds capacity.
    pub fn invariants_hold(&self) -> bool {
        self.patterns
            .values()
            .all(|p| p.sample_texts.len() <= self.sample_capacity)
    }
}
