//! Signal events broadcast by the engine.
//!
//! Subscribers (host app, an external personalized-model trainer) receive
//! these over a `tokio::sync::broadcast` channel. The engine never acts on
//! them itself — in particular, a retrain-due signal is only a hint that an
//! external trainer may refresh a downstream model.

use serde::{Deserialize, Serialize};

/// Emitted by [`crate::PolyglotEngine`] when something outside the normal
/// predict/correct cycle deserves the host's attention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    pub kind: EngineEventKind,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum EngineEventKind {
    /// The lifetime correction count crossed a multiple of the configured
    /// retrain threshold. An external trainer may refresh its model.
    #[serde(rename_all = "camelCase")]
    RetrainDue { total_corrections: u64 },
    /// A snapshot write failed; in-memory state remains authoritative and
    /// the write will be retried on the next mutating call.
    #[serde(rename_all = "camelCase")]
    PersistenceDegraded { detail: String },
    /// A previously failed snapshot write succeeded on retry.
    PersistenceRecovered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrain_event_serializes_with_camel_case_tag() {
        let event = EngineEvent {
            seq: 4,
            kind: EngineEventKind::RetrainDue {
                total_corrections: 150,
            },
        };

        let json = serde_json::to_value(&event).expect("serialize engine event");
        assert_eq!(json["seq"], 4);
        assert_eq!(json["kind"]["type"], "retrainDue");
        assert_eq!(json["kind"]["totalCorrections"], 150);

        let round_trip: EngineEvent =
            serde_json::from_value(json).expect("deserialize engine event");
        assert_eq!(
            round_trip.kind,
            EngineEventKind::RetrainDue {
                total_corrections: 150
            }
        );
    }

    #[test]
    fn persistence_degraded_carries_detail() {
        let event = EngineEvent {
            seq: 0,
            kind: EngineEventKind::PersistenceDegraded {
                detail: "disk full".into(),
            },
        };

        let json = serde_json::to_value(&event).expect("serialize engine event");
        assert_eq!(json["kind"]["type"], "persistenceDegraded");
        assert_eq!(json["kind"]["detail"], "disk full");
    }
}
