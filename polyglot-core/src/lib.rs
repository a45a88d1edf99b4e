//! # polyglot-core
//!
//! Adaptive multi-signal language-identification and feedback-learning
//! engine, packaged as a reusable SDK.
//!
//! ## Architecture
//!
//! ```text
//! text → LanguageDetector adapters → blend → weights → context → patterns → ranked
//!                                              ▲           ▲         ▲
//! user correction → CorrectionLedger ──────────┴───────────┴─────────┘
//!                        │
//!                  StateStore (four JSON records, atomic writes)
//! ```
//!
//! The engine never retrains a detector. It re-weights detector output and
//! accumulates text/context knowledge from explicit user corrections, and
//! only *signals* when an external personalized model may be due a refresh.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod detect;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod events;
pub mod learn;
pub mod store;

// Convenience re-exports for downstream crates
pub use detect::{DetectorHandle, FixedDetector, LanguageCode, LanguageDetector, ScoreMap};
pub use engine::{EngineConfig, EngineStats, PolyglotEngine, Prediction};
pub use error::PolyglotError;
pub use events::{EngineEvent, EngineEventKind};
pub use learn::{AmbientNoise, ContextSignature, Correction};
pub use store::{EngineSnapshot, JsonFileStore, MemoryStore, StateStore};
