//! Correction-driven learning stores.
//!
//! Three independent stores accumulate knowledge from user corrections and
//! feed it back into predictions:
//!
//! ```text
//! correction ──► CorrectionLedger (bounded FIFO log, accuracy trend)
//!                    ├─► PatternLibrary.absorb   (text recurrence)
//!                    ├─► ContextStore.record_or_reinforce (situational)
//!                    └─► WeightStore.reinforce   (per-language trust)
//! ```
//!
//! None of these retrain a detector; they reshape how detector output is
//! combined and ranked.

pub mod context;
pub mod ledger;
pub mod patterns;
pub mod weights;

pub use context::{AmbientNoise, ContextSignature, ContextStore, ContextualPattern};
pub use ledger::{Correction, CorrectionLedger};
pub use patterns::{LanguagePattern, PatternLibrary};
pub use weights::WeightStore;
