// kernel-core/src/model/proposal.rs
// ============================================================================
// Module: Kernel Proposed Updates
// Description: Structured recommendation to alter Baselines.
// Purpose: Define ProposedUpdate (spec.md §3), produced by PatternDetector
// and consumed only by AutoUpdateGate.
// Dependencies: crate::model::identifiers, serde_json, serde
// ============================================================================

//! ## Overview
//! `ProposedUpdate` carries enough information to preview, apply, and
//! (if needed) roll back a single change to one dotted key inside
//! `Baselines`, without PatternDetector needing to know how BaselineStore
//! applies it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::model::identifiers::ProposalId;

// ============================================================================
// SECTION: Proposal Type
// ============================================================================

/// The kind of change a [`ProposedUpdate`] recommends (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
    /// Adjusts one complexity threshold boundary.
    ThresholdAdjustment,
    /// Adjusts one DQ weight.
    WeightAdjustment,
    /// Refreshes a tier's cost table entry.
    CostRefresh,
    /// Adjusts a feedback gate threshold.
    GateAdjustment,
}

// ============================================================================
// SECTION: Proposal Status
// ============================================================================

/// Lifecycle state of a [`ProposedUpdate`] (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Awaiting gate evaluation or an operator decision.
    Proposed,
    /// Applied to the live baseline.
    Applied,
    /// Applied, then reverted by the auto-rollback monitor.
    RolledBack,
    /// Rejected by gate evaluation or baseline validation.
    Rejected,
}

// ============================================================================
// SECTION: Proposed Update
// ============================================================================

/// A structured recommendation to change one field of [`Baselines`](crate::model::baselines::Baselines)
/// (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedUpdate {
    /// Time-ordered identifier.
    pub id: ProposalId,
    /// The kind of change recommended.
    pub kind: ProposalType,
    /// Dotted key into `Baselines` (e.g. `"complexity_thresholds.fast_hi"`).
    pub target_path: String,
    /// The value currently in effect at `target_path`.
    pub current_value: Value,
    /// The value proposed for `target_path`.
    pub proposed_value: Value,
    /// Prose explanation of why this change is recommended.
    pub rationale: String,
    /// Number of decisions/feedback events the proposal is based on.
    pub sample_size: u64,
    /// Confidence in `[0, 1]`, purely derived from `sample_size` and effect size.
    pub confidence: f64,
    /// Current lifecycle state.
    pub status: ProposalStatus,
    /// Baseline version this proposal was computed against.
    pub parent_baseline_version: String,
}

impl ProposedUpdate {
    /// Whether this proposal is still awaiting a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, ProposalStatus::Proposed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ProposalStatus;
    use super::ProposalType;
    use super::ProposedUpdate;
    use crate::model::identifiers::ProposalId;

    fn sample() -> ProposedUpdate {
        ProposedUpdate {
            id: ProposalId::new(1_000, 0),
            kind: ProposalType::ThresholdAdjustment,
            target_path: "complexity_thresholds.fast_hi".to_string(),
            current_value: json!(0.25),
            proposed_value: json!(0.23),
            rationale: "fast tier failure rate exceeds threshold".to_string(),
            sample_size: 42,
            confidence: 0.9,
            status: ProposalStatus::Proposed,
            parent_baseline_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn pending_only_while_proposed() {
        let mut proposal = sample();
        assert!(proposal.is_pending());
        proposal.status = ProposalStatus::Applied;
        assert!(!proposal.is_pending());
    }
}
