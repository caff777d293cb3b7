// kernel-core/src/runtime/router.rs
// ============================================================================
// Module: Kernel Router
// Description: Orchestrates the complexity analyzer and DQ scorer over all
// candidate tiers and picks a winner.
// Purpose: Implement Router (spec.md §4.5).
// Dependencies: crate::model, crate::runtime::{complexity, dq, history}
// ============================================================================

//! ## Overview
//! `Router::route` performs no IO of its own — it computes a [`Decision`]
//! value from a query, a baseline snapshot, and a history snapshot, and
//! leaves appending it to the caller (`kernel-telemetry`'s `TelemetryStore`).
//! This mirrors `spec.md` §5: "Router never blocks on non-essential IO."

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::model::baselines::Baselines;
use crate::model::decision::Alternative;
use crate::model::decision::Decision;
use crate::model::decision::DqBreakdown;
use crate::model::hashing::QueryHash;
use crate::model::hashing::query_preview;
use crate::model::identifiers::DecisionId;
use crate::model::identifiers::SessionId;
use crate::model::tier::Tier;
use crate::model::time::Timestamp;
use crate::runtime::complexity::ComplexityAnalyzer;
use crate::runtime::dq::DqScorer;
use crate::runtime::history::HistoricalQuery;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Window within which a lower-ranked-but-cheaper tier is preferred over the
/// top-scoring one (`spec.md` §4.5 step 3).
const TIE_BREAK_WINDOW: f64 = 0.05;
/// Nominal input tokens used for the cost estimate heuristic (`spec.md` §4.5
/// step 4).
const NOMINAL_INPUT_TOKENS: f64 = 100.0;
/// Nominal output tokens used for the cost estimate heuristic.
const NOMINAL_OUTPUT_TOKENS: f64 = 500.0;
/// Tokens per million, for converting `cost_per_mtok` into a per-request cost.
const TOKENS_PER_MTOK: f64 = 1_000_000.0;

// ============================================================================
// SECTION: Route Request
// ============================================================================

/// Input to [`Router::route`].
#[derive(Debug, Clone)]
pub struct RouteRequest {
    /// The raw query text.
    pub query: String,
    /// Caller-supplied session identifier, if any.
    pub session_id: Option<SessionId>,
    /// Caller-supplied tier override, bypassing scoring (`spec.md` §6).
    pub override_tier: Option<Tier>,
}

// ============================================================================
// SECTION: Router Error
// ============================================================================

/// Failure modes surfaced by [`Router::route`] (`spec.md` §4.5, §7).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    /// The query was empty or contained only whitespace.
    #[error("query must not be empty")]
    EmptyQuery,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Stateless orchestrator: composes [`ComplexityAnalyzer`] and [`DqScorer`]
/// over every tier and builds a [`Decision`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Router {
    analyzer: ComplexityAnalyzer,
    scorer: DqScorer,
}

impl Router {
    /// Scores every tier for `request` against `baselines` and `history`,
    /// then builds the winning [`Decision`] without persisting it.
    ///
    /// `sequence` is the durable-append sequence number the caller has
    /// reserved for this decision (`spec.md` §5's ordering guarantee).
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::EmptyQuery`] when `request.query` is blank.
    pub fn route(
        &self,
        request: &RouteRequest,
        baselines: &Baselines,
        history: &[HistoricalQuery],
        sequence: u64,
        wall_unix_ms: i64,
    ) -> Result<Decision, RouterError> {
        if request.query.trim().is_empty() {
            return Err(RouterError::EmptyQuery);
        }

        let estimate = self.analyzer.estimate(&request.query, history);

        let mut alternatives: Vec<Alternative> = Tier::ALL
            .iter()
            .map(|&tier| {
                let dq = self.scorer.score(&request.query, estimate.score, tier, history, baselines);
                Alternative {
                    tier,
                    dq: DqBreakdown {
                        total: dq.total,
                        validity: dq.validity,
                        specificity: dq.specificity,
                        correctness: dq.correctness,
                    },
                }
            })
            .collect();

        let chosen_tier = request.override_tier.unwrap_or_else(|| rank_and_select(&alternatives, baselines));
        let chosen = alternatives[chosen_tier.index()];

        alternatives.sort_by(|a, b| a.tier.index().cmp(&b.tier.index()));

        let cost_estimate = estimate_cost(chosen_tier, baselines);

        Ok(Decision {
            id: DecisionId::new(),
            ts: Timestamp::new(sequence, wall_unix_ms),
            query_hash: QueryHash::of(&request.query),
            query_preview: query_preview(&request.query),
            complexity: estimate.score,
            complexity_rationale: estimate.rationale,
            chosen_tier,
            dq: chosen.dq,
            alternatives,
            cost_estimate,
            baseline_version: baselines.version.clone(),
            session_id: request.session_id.clone(),
            overridden: request.override_tier.is_some(),
            outcome: None,
            feedback_ts: None,
        })
    }
}

// ============================================================================
// SECTION: Ranking & Cost
// ============================================================================

/// Ranks alternatives by DQ descending, then applies the cost-aware
/// tie-break window (`spec.md` §4.5 step 3, §8: "cost-tied tiers: pick the
/// cheapest; if costs are equal, the lower-index tier").
fn rank_and_select(alternatives: &[Alternative], baselines: &Baselines) -> Tier {
    let mut ranked: Vec<&Alternative> = alternatives.iter().collect();
    ranked.sort_by(|a, b| b.dq.total.partial_cmp(&a.dq.total).unwrap_or(std::cmp::Ordering::Equal));

    let top_total = ranked[0].dq.total;
    let contenders: Vec<&Alternative> = ranked.into_iter().filter(|alt| top_total - alt.dq.total <= TIE_BREAK_WINDOW).collect();

    contenders
        .into_iter()
        .min_by(|a, b| {
            let cost_a = baselines.cost_for(a.tier);
            let cost_b = baselines.cost_for(b.tier);
            let total_a = cost_a.input + cost_a.output;
            let total_b = cost_b.input + cost_b.output;
            total_a.partial_cmp(&total_b).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.tier.index().cmp(&b.tier.index()))
        })
        .map(|alt| alt.tier)
        .unwrap_or(Tier::Fast)
}

fn estimate_cost(tier: Tier, baselines: &Baselines) -> f64 {
    let cost = baselines.cost_for(tier);
    (NOMINAL_INPUT_TOKENS * cost.input + NOMINAL_OUTPUT_TOKENS * cost.output) / TOKENS_PER_MTOK
}
