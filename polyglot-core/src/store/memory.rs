//! In-memory snapshot backend for tests and persistence-free hosts.

use parking_lot::Mutex;

use crate::error::{PolyglotError, Result};
use crate::store::{EngineSnapshot, StateStore};

/// Store that keeps the latest snapshot in memory.
///
/// `fail_saves` makes every `save` return an error, for exercising the
/// engine's degraded-persistence path.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<EngineSnapshot>>,
    fail_saves: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure injection for subsequent saves.
    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock() = fail;
    }

    /// Number of snapshots retained (0 or 1).
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.lock().is_some()
    }
}

impl StateStore for MemoryStore {
    fn save(&self, snapshot: &EngineSnapshot) -> Result<()> {
        if *self.fail_saves.lock() {
            return Err(PolyglotError::Persistence(
                "memory store save failure injected".into(),
            ));
        }
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self, defaults: EngineSnapshot) -> Result<EngineSnapshot> {
        Ok(self.snapshot.lock().clone().unwrap_or(defaults))
    }
}
