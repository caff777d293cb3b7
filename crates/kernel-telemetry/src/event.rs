// kernel-telemetry/src/event.rs
// ============================================================================
// Module: Telemetry Event Envelope
// Description: Self-delimiting, forward-compatible event record.
// Purpose: Implement the event record format (spec.md §6): record-type tag,
// monotonic sequence, wall-clock timestamp, baseline version, payload.
// Dependencies: kernel-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every event is stored as one JSON object per line. `schema_version` lets
//! future payload variants be added without breaking old readers; any field
//! an older reader's `EventPayload` variant doesn't recognise is preserved
//! in `extra` on a read-modify-write rather than silently dropped
//! (`spec.md` §6, §9's "version-tagged envelope" replacement pattern).

// ============================================================================
// SECTION: Imports
// ============================================================================

use kernel_core::Decision;
use kernel_core::DecisionId;
use kernel_core::EscalationEvent;
use kernel_core::Outcome;
use kernel_core::SessionOutcome;
use kernel_core::Tier;
use serde::Deserialize;
use serde::Serialize;

/// Current envelope schema version.
pub const SCHEMA_VERSION: u16 = 1;

// ============================================================================
// SECTION: Event Payload
// ============================================================================

/// The type-specific body of one event (`spec.md` §3, §4.2, §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A new [`Decision`] was recorded by the router.
    DecisionRecorded {
        /// The decision that was recorded.
        decision: Box<Decision>,
    },
    /// An outcome was attached to a previously recorded decision.
    OutcomeAttached {
        /// The decision the outcome applies to.
        decision_id: DecisionId,
        /// The resolved outcome.
        outcome: Outcome,
        /// Wall-clock time the outcome was attached, in Unix milliseconds.
        feedback_ts: i64,
        /// Confidence of the prefix match that resolved this decision,
        /// `1.0` when resolved by direct id (`spec.md` §4.2).
        match_confidence: f64,
    },
    /// A decision's chosen tier failed and the caller escalated to a
    /// stronger tier, minting a new decision (`spec.md` §4.6, §9).
    EscalationRecorded {
        /// The escalation link.
        escalation: EscalationEvent,
    },
    /// A session concluded and its aggregate outcome was computed.
    SessionOutcomeRecorded {
        /// The computed session outcome.
        outcome: SessionOutcome,
    },
    /// The router's scoring ceiling was exceeded; the rule-based fallback
    /// tier selector decided this decision instead (`spec.md` §5, §4.5).
    FallbackUsed {
        /// The decision the fallback path produced.
        decision_id: DecisionId,
        /// Tier the fallback selector chose.
        tier: Tier,
    },
    /// An applied proposal was automatically reverted after the post-apply
    /// monitor detected an efficiency regression (`spec.md` §4.8, §8
    /// scenario 6).
    RollbackTriggered {
        /// The proposal that was reverted.
        proposal_id: String,
        /// Baseline version restored.
        reverted_to_version: String,
    },
}

// ============================================================================
// SECTION: Event Envelope
// ============================================================================

/// One durable, append-only telemetry record (`spec.md` §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Envelope format version.
    pub schema_version: u16,
    /// Monotonically increasing append sequence within this store.
    pub sequence: u64,
    /// Wall-clock time the event was appended, in Unix milliseconds.
    pub wall_unix_ms: i64,
    /// Baselines version in effect when this event was produced.
    pub baseline_version: String,
    /// The type-specific payload.
    pub payload: EventPayload,
    /// Unknown fields from a newer schema version, preserved verbatim.
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EventEnvelope {
    /// Builds an envelope at the current [`SCHEMA_VERSION`].
    #[must_use]
    pub fn new(sequence: u64, wall_unix_ms: i64, baseline_version: String, payload: EventPayload) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            sequence,
            wall_unix_ms,
            baseline_version,
            payload,
            extra: serde_json::Map::new(),
        }
    }

    /// Returns the day partition index this event belongs to
    /// (`spec.md` §6: "event logs partitioned by day").
    #[must_use]
    pub const fn day_index(&self) -> i64 {
        const MS_PER_DAY: i64 = 86_400_000;
        self.wall_unix_ms.div_euclid(MS_PER_DAY)
    }
}

#[cfg(test)]
mod tests {
    use kernel_core::DecisionId;
    use kernel_core::Outcome;

    use super::EventEnvelope;
    use super::EventPayload;

    #[test]
    fn round_trips_through_json_preserving_unknown_fields() {
        let mut envelope = EventEnvelope::new(
            1,
            0,
            "1.0.0".to_string(),
            EventPayload::OutcomeAttached {
                decision_id: DecisionId::new(),
                outcome: Outcome::Success,
                feedback_ts: 10,
                match_confidence: 1.0,
            },
        );
        envelope.extra.insert("future_field".to_string(), serde_json::json!("kept"));

        let json = serde_json::to_string(&envelope).expect("serialize");
        let back: EventEnvelope = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.extra.get("future_field").and_then(|v| v.as_str()), Some("kept"));
    }

    #[test]
    fn day_index_partitions_by_86400000_ms() {
        let envelope = EventEnvelope::new(
            1,
            86_400_000,
            "1.0.0".to_string(),
            EventPayload::OutcomeAttached {
                decision_id: DecisionId::new(),
                outcome: Outcome::Success,
                feedback_ts: 10,
                match_confidence: 1.0,
            },
        );
        assert_eq!(envelope.day_index(), 1);
    }
}
