//! Language detector abstraction.
//!
//! The `LanguageDetector` trait decouples the engine from any specific
//! signal source (rule-based script detector, contextual-embedding detector,
//! similarity/n-gram detector, remote service, etc.). The engine consumes
//! only the score maps these produce — never their internals — and is
//! agnostic to how many detectors are attached.
//!
//! `&mut self` on `detect` intentionally allows stateful backends (embedding
//! caches, session handles). All mutation is serialised through
//! `DetectorHandle`'s `parking_lot::Mutex`.

pub mod stub;

pub use stub::FixedDetector;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// Short stable language identifier (ISO 639-1-like, e.g. `"hi"`, `"en"`).
///
/// Treated as an opaque key: the engine never validates codes against a
/// closed enum. The supported set is whatever the attached detectors and the
/// user's corrections produce.
pub type LanguageCode = String;

/// Per-language confidence in [0, 1].
///
/// Input maps are not required to sum to 1; normalization happens after
/// adaptive weighting. `BTreeMap` keeps iteration order deterministic, which
/// the prediction explanation contract depends on.
pub type ScoreMap = BTreeMap<LanguageCode, f32>;

/// Contract for language-guess signal sources.
pub trait LanguageDetector: Send + 'static {
    /// Human-readable name used in logs and prediction explanations.
    fn name(&self) -> &str;

    /// Score `text` against every language this detector recognises.
    ///
    /// # Returns
    /// A map of language code → confidence in [0, 1]. May be empty when the
    /// detector has no opinion. Languages missing from the map are treated
    /// as absent, not as zero.
    ///
    /// # Errors
    /// A failing detector is never fatal to a prediction — the engine logs
    /// the error and omits this detector's contribution.
    fn detect(&mut self, text: &str) -> Result<ScoreMap>;
}

/// Thread-safe reference-counted handle to any `LanguageDetector` implementor.
///
/// Uses `parking_lot::Mutex` for non-poisoning on panic and cheaper
/// uncontended locking than `std::sync::Mutex`.
#[derive(Clone)]
pub struct DetectorHandle(pub Arc<Mutex<dyn LanguageDetector>>);

impl DetectorHandle {
    /// Wrap any `LanguageDetector` in a `DetectorHandle`.
    pub fn new<D: LanguageDetector>(detector: D) -> Self {
        Self(Arc::new(Mutex::new(detector)))
    }
}

impl std::fmt::Debug for DetectorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorHandle").finish_non_exhaustive()
    }
}
