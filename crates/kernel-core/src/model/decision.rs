// kernel-core/src/model/decision.rs
// ============================================================================
// Module: Kernel Decision Record
// Description: One persisted routing decision.
// Purpose: Define the Decision type, its lifecycle fields, and the DQ
// breakdown attached to each tier that was scored.
// Dependencies: crate::model::{hashing, identifiers, tier, time}, serde
// ============================================================================

//! ## Overview
//! A `Decision` is created once by the router and is never deleted.
//! `FeedbackIngest` is the only component permitted to mutate it afterward,
//! and only to attach an outcome (`spec.md` §3).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::model::hashing::QueryHash;
use crate::model::identifiers::DecisionId;
use crate::model::identifiers::SessionId;
use crate::model::signal::Outcome;
use crate::model::tier::Tier;
use crate::model::time::Timestamp;

// ============================================================================
// SECTION: DQ Breakdown
// ============================================================================

/// The three DQ components plus their weighted total (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DqBreakdown {
    /// Weighted total of the three components.
    pub total: f64,
    /// Validity component.
    pub validity: f64,
    /// Specificity component.
    pub specificity: f64,
    /// Correctness component.
    pub correctness: f64,
}

/// One tier's DQ score, recorded among a decision's alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// The tier this alternative describes.
    pub tier: Tier,
    /// That tier's DQ breakdown.
    pub dq: DqBreakdown,
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// One persisted routing decision (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Unique identifier.
    pub id: DecisionId,
    /// Durable-append timestamp.
    pub ts: Timestamp,
    /// Stable hash of the raw query text.
    pub query_hash: QueryHash,
    /// Truncated (<= 50 char) preview of the query, never the full text.
    pub query_preview: String,
    /// Estimated complexity in `[0, 1]`.
    pub complexity: f64,
    /// Human-readable rationale for the complexity estimate.
    pub complexity_rationale: String,
    /// The tier the router chose.
    pub chosen_tier: Tier,
    /// DQ breakdown for the chosen tier.
    pub dq: DqBreakdown,
    /// DQ breakdown for every tier that was scored, including the winner.
    pub alternatives: Vec<Alternative>,
    /// Estimated normalised cost of serving this request at `chosen_tier`.
    pub cost_estimate: f64,
    /// Baselines version in effect when this decision was made.
    pub baseline_version: String,
    /// Caller-supplied session identifier, if any.
    pub session_id: Option<SessionId>,
    /// Whether the caller overrode routing with an explicit tier.
    pub overridden: bool,
    /// Outcome attached by `FeedbackIngest`, if any (`None` until feedback
    /// arrives or the grace-period sweep marks it `unknown_timeout`).
    pub outcome: Option<Outcome>,
    /// Wall-clock time feedback was attached, in Unix milliseconds.
    pub feedback_ts: Option<i64>,
}

impl Decision {
    /// Whether this decision is "confident" per the active baseline's
    /// actionable threshold (`spec.md` §4.4).
    #[must_use]
    pub fn is_actionable(&self, actionable_threshold: f64) -> bool {
        self.dq.total >= actionable_threshold
    }

    /// Whether feedback has resolved this decision to a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }
}
