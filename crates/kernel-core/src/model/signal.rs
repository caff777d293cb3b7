// kernel-core/src/model/signal.rs
// ============================================================================
// Module: Kernel Outcome Signals
// Description: Feedback signals attached to decisions, and escalation links.
// Purpose: Define OutcomeSignal, Outcome, and EscalationEvent (spec.md §3, §4.6).
// Dependencies: crate::model::identifiers, serde
// ============================================================================

//! ## Overview
//! Outcome signals are how callers report success, failure, or escalation
//! back to the kernel. `spec.md` §7 treats the retry-as-new-decision open
//! question as resolved: escalations mint a new `Decision` and record an
//! [`EscalationEvent`] linking it to the decision that failed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::model::identifiers::DecisionId;
use crate::model::time::Timestamp;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Terminal outcome states for a decision (`spec.md` §3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The chosen tier served the request successfully.
    Success,
    /// The chosen tier failed to serve the request.
    Failure,
    /// No feedback arrived before the grace period elapsed.
    UnknownTimeout,
}

// ============================================================================
// SECTION: Escalation Reason
// ============================================================================

/// Why a decision was escalated to a stronger tier (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// The invoked process/tool exited with a non-zero status.
    ExitCode,
    /// The chosen tier could not perform the requested capability.
    CapabilityLimitation,
    /// The response was truncated before completion.
    TruncatedResponse,
    /// The user explicitly rejected the response.
    UserRejection,
}

// ============================================================================
// SECTION: Signal Target
// ============================================================================

/// How an outcome signal identifies the decision it applies to
/// (`spec.md` §6: "by decision id or by query prefix").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTarget {
    /// Direct reference to a decision id.
    DecisionId(DecisionId),
    /// Best-effort prefix match against a query (`spec.md` §4.2).
    QueryPrefix(String),
}

// ============================================================================
// SECTION: Outcome Signal
// ============================================================================

/// A success/failure/escalation signal submitted by a caller (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSignal {
    /// Which decision this signal applies to.
    pub target: SignalTarget,
    /// The reported outcome kind.
    pub signal: SignalKind,
    /// Escalation reason, present only when `signal` is `Escalation`.
    pub escalation_reason: Option<EscalationReason>,
    /// Wall-clock time the signal was observed, in Unix milliseconds.
    pub observed_at_unix_ms: i64,
}

/// The kind of signal a caller is reporting (distinct from [`Outcome`]:
/// `Escalation` is not itself terminal — it produces a new decision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// The chosen tier served the request successfully.
    Success,
    /// The chosen tier failed to serve the request.
    Failure,
    /// The request was retried at a higher tier.
    Escalation,
}

// ============================================================================
// SECTION: Escalation Event
// ============================================================================

/// Links a failed decision to the new decision that retried it at a higher
/// tier (`spec.md` §4.6, §7's resolved open question).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationEvent {
    /// The decision that failed and triggered the escalation.
    pub original_decision_id: DecisionId,
    /// The new decision created for the retry.
    pub new_decision_id: DecisionId,
    /// Why the escalation happened.
    pub reason: EscalationReason,
    /// Durable-append timestamp.
    pub ts: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::EscalationReason;
    use super::SignalKind;
    use super::SignalTarget;

    #[test]
    fn signal_target_serializes_as_tagged_enum() {
        let target = SignalTarget::QueryPrefix("hel".to_string());
        let json = serde_json::to_string(&target).expect("serialize");
        assert!(json.contains("query_prefix"));
    }

    #[test]
    fn escalation_reason_round_trips() {
        let json = serde_json::to_string(&EscalationReason::CapabilityLimitation).expect("serialize");
        let back: EscalationReason = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, EscalationReason::CapabilityLimitation);
    }

    #[test]
    fn signal_kind_is_distinct_from_terminal_outcome() {
        assert_ne!(
            serde_json::to_string(&SignalKind::Escalation).expect("serialize"),
            serde_json::to_string(&crate::model::signal::Outcome::Success).expect("serialize")
        );
    }
}
