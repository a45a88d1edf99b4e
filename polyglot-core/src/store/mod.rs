//! Persistence of learned state.
//!
//! The `StateStore` trait decouples the engine from any specific backend.
//! The snapshot is four logical records — adaptive weights, language
//! patterns, contextual patterns, correction ledger — each independently
//! serializable as JSON. This state never crosses a network boundary, so no
//! binary wire format is involved.
//!
//! A failed save is never fatal: in-memory state stays authoritative for the
//! session and the engine retries on the next mutating call.

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::learn::{ContextStore, CorrectionLedger, PatternLibrary, WeightStore};

/// Full learned state of an engine at one point in time.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub weights: WeightStore,
    pub patterns: PatternLibrary,
    pub contexts: ContextStore,
    pub ledger: CorrectionLedger,
}

impl EngineSnapshot {
    /// An empty snapshot with the given capacity bounds — the state of a
    /// first run, and the state after `reset()`.
    pub fn empty(sample_capacity: usize, ledger_capacity: usize) -> Self {
        Self {
            weights: WeightStore::new(),
            patterns: PatternLibrary::new(sample_capacity),
            contexts: ContextStore::new(),
            ledger: CorrectionLedger::new(ledger_capacity),
        }
    }

    /// `true` when every persisted-collection invariant holds.
    pub fn invariants_hold(&self) -> bool {
        self.weights.invariants_hold()
            && self.patterns.invariants_hold()
            && self.contexts.invariants_hold()
            && self.ledger.invariants_hold()
    }
}

/// Contract for snapshot persistence backends.
pub trait StateStore: Send + Sync + 'static {
    /// Durably write the snapshot. Must be atomic per record: a crash mid-
    /// save may lose the newest snapshot but never leaves a torn record.
    fn save(&self, snapshot: &EngineSnapshot) -> Result<()>;

    /// Load the persisted snapshot, substituting the corresponding record
    /// from `defaults` for anything not present. Returns `defaults`
    /// untouched on a first run.
    fn load(&self, defaults: EngineSnapshot) -> Result<EngineSnapshot>;
}

impl<S: StateStore> StateStore for std::sync::Arc<S> {
    fn save(&self, snapshot: &EngineSnapshot) -> Result<()> {
        (**self).save(snapshot)
    }

    fn load(&self, defaults: EngineSnapshot) -> Result<EngineSnapshot> {
        (**self).load(defaults)
    }
}
