//! `PolyglotEngine` — the engine's single public entry point.
//!
//! ## Data flow
//!
//! ```text
//! predict(text, context)
//!     detectors ─► blend ─► weights ─► context nudge ─► pattern nudge ─► ranked
//!
//! submit_correction(text, detected, correct, …)
//!     ledger ─► { pattern library, context store, weight store } ─► snapshot saved
//! ```
//!
//! ## Threading
//!
//! `PolyglotEngine` is `Send + Sync` — all learned state sits behind one
//! `parking_lot::Mutex`, which serializes predictions against corrections:
//! a prediction never observes a half-applied correction, and a correction
//! is durably persisted before `submit_correction` returns, so the next
//! `predict` always sees updated weights. Wrap in `Arc<PolyglotEngine>` to
//! share with host-app state and event-forwarding tasks.

pub mod predict;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    detect::DetectorHandle,
    error::Result,
    events::{EngineEvent, EngineEventKind},
    learn::{context::ContextSignature, Correction},
    store::{EngineSnapshot, StateStore},
};

pub use predict::Prediction;

/// Broadcast channel capacity: 64 engine events buffered for slow consumers.
const BROADCAST_CAP: usize = 64;

/// Configuration for `PolyglotEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Language reported when no detector produces any signal. Default: "en".
    pub default_language: String,
    /// Additive weight step applied per correction. Default: 0.05.
    pub learning_rate: f32,
    /// Multiplier on contextual-pattern strength when nudging scores.
    /// Default: 0.05.
    pub context_adjustment_factor: f32,
    /// Multiplier on pattern-library resemblance when nudging scores.
    /// Default: 0.3.
    pub pattern_adjustment_weight: f32,
    /// Maximum retained text samples per language. Default: 50.
    pub sample_capacity: usize,
    /// Maximum retained corrections (FIFO eviction). Default: 500.
    pub ledger_capacity: usize,
    /// Window size for the rolling accuracy trend. Default: 10.
    pub trend_window: usize,
    /// A retrain-due event fires each time the lifetime correction count
    /// crosses a multiple of this. 0 disables the signal. Default: 50.
    pub retrain_threshold: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            learning_rate: 0.05,
            context_adjustment_factor: 0.05,
            pattern_adjustment_weight: 0.3,
            sample_capacity: 50,
            ledger_capacity: 500,
            trend_window: 10,
            retrain_threshold: 50,
        }
    }
}

/// Learning-state counters reported by [`PolyglotEngine::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    /// Corrections currently retained in the ledger.
    pub total_corrections: usize,
    /// Recent-window agreement rate minus the preceding window's.
    pub accuracy_trend: f32,
    /// Languages with at least one learned text pattern.
    pub learned_language_patterns: usize,
    /// Contextual patterns currently stored.
    pub contextual_patterns: usize,
}

/// Shared operation counters for observability.
#[derive(Debug, Default)]
pub struct EngineDiagnostics {
    pub predictions: AtomicUsize,
    pub fallback_predictions: AtomicUsize,
    pub detector_failures: AtomicUsize,
    pub corrections_recorded: AtomicUsize,
    pub snapshot_saves: AtomicUsize,
    pub snapshot_save_failures: AtomicUsize,
}

impl EngineDiagnostics {
    pub(crate) fn record_fallback(&self) {
        self.fallback_predictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_detector_failure(&self) {
        self.detector_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            predictions: self.predictions.load(Ordering::Relaxed),
            fallback_predictions: self.fallback_predictions.load(Ordering::Relaxed),
            detector_failures: self.detector_failures.load(Ordering::Relaxed),
            corrections_recorded: self.corrections_recorded.load(Ordering::Relaxed),
            snapshot_saves: self.snapshot_saves.load(Ordering::Relaxed),
            snapshot_save_failures: self.snapshot_save_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsSnapshot {
    pub predictions: usize,
    pub fallback_predictions: usize,
    pub detector_failures: usize,
    pub corrections_recorded: usize,
    pub snapshot_saves: usize,
    pub snapshot_save_failures: usize,
}

/// Learned state plus persistence bookkeeping, guarded as one unit.
struct EngineState {
    snapshot: EngineSnapshot,
    /// Set when the last save failed; cleared on the first successful retry.
    persist_degraded: bool,
}

/// The adaptive language-identification engine.
pub struct PolyglotEngine {
    config: EngineConfig,
    detectors: Vec<DetectorHandle>,
    store: Box<dyn StateStore>,
    /// Single mutual-exclusion boundary around all learned state.
    state: Mutex<EngineState>,
    /// Broadcast sender for retrain-due / persistence events.
    events_tx: broadcast::Sender<EngineEvent>,
    /// Monotonically increasing event sequence counter.
    seq: AtomicU64,
    diagnostics: EngineDiagnostics,
}

impl PolyglotEngine {
    /// Create an engine, loading any persisted snapshot from `store`.
    ///
    /// # Errors
    /// Fails only when a persisted record exists but cannot be read — a
    /// first run with no prior state always succeeds.
    pub fn new(
        config: EngineConfig,
        detectors: Vec<DetectorHandle>,
        store: impl StateStore,
    ) -> Result<Self> {
        let defaults = EngineSnapshot::empty(config.sample_capacity, config.ledger_capacity);
        let mut snapshot = store.load(defaults)?;
        // A snapshot saved under different capacity bounds must not outrank
        // the current configuration; re-bound and evict oldest entries.
        snapshot.ledger.set_capacity(config.ledger_capacity);
        snapshot.patterns.set_sample_capacity(config.sample_capacity);
        let (events_tx, _) = broadcast::channel(BROADCAST_CAP);

        info!(
            detectors = detectors.len(),
            corrections = snapshot.ledger.len(),
            learned_patterns = snapshot.patterns.len(),
            "engine ready"
        );

        Ok(Self {
            config,
            detectors,
            store: Box::new(store),
            state: Mutex::new(EngineState {
                snapshot,
                persist_degraded: false,
            }),
            events_tx,
            seq: AtomicU64::new(0),
            diagnostics: EngineDiagnostics::default(),
        })
    }

    /// Identify the language of `text` given the caller's situational
    /// context. Synchronous, mutation-free, never fails: missing detector
    /// signals degrade to the documented fallback result.
    pub fn predict(&self, text: &str, context: &ContextSignature) -> Prediction {
        self.diagnostics.predictions.fetch_add(1, Ordering::Relaxed);
        let state = self.state.lock();
        predict::run(
            &self.config,
            &self.detectors,
            &state.snapshot,
            &self.diagnostics,
            text,
            context,
        )
    }

    /// Record a user correction: the ground-truth language for `text` that
    /// was detected as `detected`.
    ///
    /// Applies, in order and as one logical unit: pattern absorb, contextual
    /// record-or-reinforce, weight reinforcement, ledger append. The updated
    /// snapshot is persisted before this returns; a failed write is logged,
    /// broadcast as a degradation event, and retried on the next mutating
    /// call — never an error to the caller.
    pub fn submit_correction(
        &self,
        text: &str,
        detected: &str,
        correct: &str,
        confidence: f32,
        context: &ContextSignature,
    ) {
        let mut state = self.state.lock();

        state.snapshot.patterns.absorb(text, correct);
        state.snapshot.contexts.record_or_reinforce(context, correct);
        state
            .snapshot
            .weights
            .reinforce(correct, detected, self.config.learning_rate);
        state.snapshot.ledger.record(Correction::new(
            text,
            detected,
            correct,
            confidence,
            context.clone(),
        ));

        self.diagnostics
            .corrections_recorded
            .fetch_add(1, Ordering::Relaxed);

        let lifetime = state.snapshot.ledger.lifetime_total();
        info!(
            detected,
            correct,
            lifetime_corrections = lifetime,
            "correction recorded"
        );

        if self.config.retrain_threshold > 0 && lifetime % self.config.retrain_threshold == 0 {
            info!(lifetime_corrections = lifetime, "retrain threshold crossed");
            self.emit(EngineEventKind::RetrainDue {
                total_corrections: lifetime,
            });
        }

        self.persist(&mut state);
    }

    /// Current learning-state counters (snapshot).
    pub fn stats(&self) -> EngineStats {
        let state = self.state.lock();
        EngineStats {
            total_corrections: state.snapshot.ledger.len(),
            accuracy_trend: state.snapshot.ledger.accuracy_trend(self.config.trend_window),
            learned_language_patterns: state.snapshot.patterns.len(),
            contextual_patterns: state.snapshot.contexts.len(),
        }
    }

    /// Wipe all learned state in one step and persist the empty state.
    /// After this, the engine behaves exactly like a freshly constructed one.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.snapshot =
            EngineSnapshot::empty(self.config.sample_capacity, self.config.ledger_capacity);
        info!("learned state reset");
        self.persist(&mut state);
    }

    /// Subscribe to retrain-due and persistence events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events_tx.subscribe()
    }

    /// Snapshot of operation counters for observability.
    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn persist(&self, state: &mut EngineState) {
        match self.store.save(&state.snapshot) {
            Ok(()) => {
                self.diagnostics
                    .snapshot_saves
                    .fetch_add(1, Ordering::Relaxed);
                if state.persist_degraded {
                    state.persist_degraded = false;
                    info!("snapshot persistence recovered");
                    self.emit(EngineEventKind::PersistenceRecovered);
                }
            }
            Err(e) => {
                self.diagnostics
                    .snapshot_save_failures
                    .fetch_add(1, Ordering::Relaxed);
                state.persist_degraded = true;
                warn!(error = %e, "snapshot save failed — in-memory state remains authoritative; will retry on next mutation");
                self.emit(EngineEventKind::PersistenceDegraded {
                    detail: e.to_string(),
                });
            }
        }
    }

    fn emit(&self, kind: EngineEventKind) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let _ = self.events_tx.send(EngineEvent { seq, kind });
    }
}
