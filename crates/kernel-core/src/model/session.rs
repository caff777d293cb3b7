// kernel-core/src/model/session.rs
// ============================================================================
// Module: Kernel Session Outcomes
// Description: Aggregate quality/efficiency record for one session.
// Purpose: Define SessionOutcome (spec.md §3), derived from decisions and
// outcome signals rather than persisted as raw input.
// Dependencies: crate::model::identifiers, serde
// ============================================================================

//! ## Overview
//! `SessionOutcome` is always *derived* — from the decisions and outcome
//! signals sharing a `session_id` — and may be recomputed at any time
//! (`spec.md` §3).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::model::identifiers::SessionId;

// ============================================================================
// SECTION: Session Status
// ============================================================================

/// How a session concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The session ran to a natural conclusion.
    Completed,
    /// The session was interrupted mid-flow.
    Interrupted,
    /// The session was abandoned without completing its goal.
    Abandoned,
}

// ============================================================================
// SECTION: Session Outcome
// ============================================================================

/// Aggregate outcome for one session (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Session identifier this aggregate describes.
    pub session_id: SessionId,
    /// Wall-clock time of the session's first decision, in Unix milliseconds.
    pub started_at_unix_ms: i64,
    /// Wall-clock time of the session's last decision, in Unix milliseconds.
    pub ended_at_unix_ms: i64,
    /// Number of routed messages in the session.
    pub message_count: u32,
    /// Number of tool invocations observed in the session.
    pub tool_count: u32,
    /// Subjective quality rating in `[1, 5]`.
    pub quality: f64,
    /// Mean complexity across the session's decisions.
    pub complexity_avg: f64,
    /// Rolling tier efficiency (successful decisions / total) in `[0, 1]`.
    pub tier_efficiency: f64,
    /// How the session concluded.
    pub outcome: SessionStatus,
}

impl SessionOutcome {
    /// Validates the bounded fields (`quality` and `tier_efficiency`).
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        (1.0..=5.0).contains(&self.quality) && (0.0..=1.0).contains(&self.tier_efficiency)
    }
}
