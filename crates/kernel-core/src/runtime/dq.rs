// kernel-core/src/runtime/dq.rs
// ============================================================================
// Module: Kernel Decision-Quality Scorer
// Description: Scores one candidate tier against a query's complexity.
// Purpose: Implement DQScorer (spec.md §4.4).
// Dependencies: crate::model::{baselines, tier}, crate::runtime::history
// ============================================================================

//! ## Overview
//! `DqScorer::score` is pure given its inputs: the same `(query, complexity,
//! tier, history, baselines)` always yields the same [`DqScore`]
//! (`spec.md` §8's determinism law).

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::model::baselines::Baselines;
use crate::model::signal::Outcome;
use crate::model::tier::Tier;
use crate::runtime::history::HistoricalQuery;
use crate::runtime::history::similar;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Multiplier applied to excess complexity beyond a tier's upper bound when
/// that tier under-provisions the request (`spec.md` §4.4).
const UNDER_PROVISION_PENALTY_MULTIPLIER: f64 = 2.0;
/// Multiplier applied to the gap below a tier's lower bound when that tier
/// over-provisions the request (`spec.md` §4.4).
const OVER_PROVISION_PENALTY_MULTIPLIER: f64 = 0.5;
/// Specificity awarded for an exact tier match.
const SPECIFICITY_EXACT: f64 = 1.0;
/// Specificity awarded for an adjacent tier match.
const SPECIFICITY_ADJACENT: f64 = 0.6;
/// Specificity awarded for a distant tier match.
const SPECIFICITY_DISTANT: f64 = 0.2;
/// Correctness assigned when no similar history exists at all.
const CORRECTNESS_NO_HISTORY: f64 = 0.5;

// ============================================================================
// SECTION: DQ Score
// ============================================================================

/// The outcome of one [`DqScorer::score`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DqScore {
    /// Weighted total across all three components.
    pub total: f64,
    /// Validity component.
    pub validity: f64,
    /// Specificity component.
    pub specificity: f64,
    /// Correctness component.
    pub correctness: f64,
    /// Whether `total` meets `baselines.actionable_threshold`.
    pub actionable: bool,
}

// ============================================================================
// SECTION: DQ Scorer
// ============================================================================

/// Stateless scorer for one (query, tier) candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DqScorer;

impl DqScorer {
    /// Runs the full scoring contract described in `spec.md` §4.4.
    #[must_use]
    pub fn score(&self, query: &str, complexity: f64, tier: Tier, history: &[HistoricalQuery], baselines: &Baselines) -> DqScore {
        let validity = validity_component(complexity, tier, &baselines.complexity_thresholds);
        let specificity = specificity_component(complexity, tier, &baselines.complexity_thresholds);
        let correctness = correctness_component(query, history);

        let weights = baselines.dq_weights;
        let total = weights.validity * validity + weights.specificity * specificity + weights.correctness * correctness;

        DqScore {
            total,
            validity,
            specificity,
            correctness,
            actionable: total >= baselines.actionable_threshold,
        }
    }
}

// ============================================================================
// SECTION: Components
// ============================================================================

fn validity_component(complexity: f64, tier: Tier, thresholds: &crate::model::baselines::ComplexityThresholds) -> f64 {
    let (lo, hi) = thresholds.range_for(tier);
    if complexity >= hi && tier != Tier::Strong {
        let excess = complexity - hi;
        (1.0 - UNDER_PROVISION_PENALTY_MULTIPLIER * excess).max(0.0)
    } else if complexity < lo {
        let gap = lo - complexity;
        (1.0 - OVER_PROVISION_PENALTY_MULTIPLIER * gap).max(0.0)
    } else {
        1.0
    }
}

fn specificity_component(complexity: f64, tier: Tier, thresholds: &crate::model::baselines::ComplexityThresholds) -> f64 {
    let ideal = thresholds.tier_for(complexity);
    if ideal == tier {
        SPECIFICITY_EXACT
    } else if ideal.below() == Some(tier) || ideal.above() == Some(tier) {
        SPECIFICITY_ADJACENT
    } else {
        SPECIFICITY_DISTANT
    }
}

fn correctness_component(query: &str, history: &[HistoricalQuery]) -> f64 {
    let matches = similar(query, history);
    if matches.is_empty() {
        return CORRECTNESS_NO_HISTORY;
    }
    let with_outcome: Vec<&HistoricalQuery> = matches.iter().filter_map(|(entry, _)| entry.outcome.map(|_| *entry)).collect();
    if !with_outcome.is_empty() {
        let successes = with_outcome.iter().filter(|entry| entry.outcome == Some(Outcome::Success)).count();
        successes as f64 / with_outcome.len() as f64
    } else {
        matches.iter().map(|(entry, _)| entry.dq_total).sum::<f64>() / matches.len() as f64
    }
}
