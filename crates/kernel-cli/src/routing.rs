// kernel-cli/src/routing.rs
// ============================================================================
// Module: Router Ceiling
// Description: Wraps Router::route with a hard wall-clock ceiling and a
// rule-based fallback tier selector.
// Purpose: Implement the 200 ms routing ceiling (spec.md §5): on expiry,
// fall back to Baselines.complexity_thresholds.tier_for rather than the
// full DQ-scored path, and record that the fallback fired.
// Dependencies: kernel-core, tokio
// ============================================================================

//! ## Overview
//! `Router::route` is pure CPU-bound work, so the ceiling is enforced by
//! running it on `tokio::task::spawn_blocking` and racing it against
//! `tokio::time::timeout`. On expiry the fallback still needs *a* complexity
//! estimate to pick a tier by, so it runs the (cheap) `ComplexityAnalyzer`
//! alone and scores only the tier it lands on — the part the ceiling exists
//! to skip is the three-way DQ comparison, not the estimate itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use kernel_core::Alternative;
use kernel_core::Baselines;
use kernel_core::ComplexityAnalyzer;
use kernel_core::Decision;
use kernel_core::DecisionId;
use kernel_core::DqBreakdown;
use kernel_core::DqScorer;
use kernel_core::HistoricalQuery;
use kernel_core::QueryHash;
use kernel_core::RouteRequest;
use kernel_core::Router;
use kernel_core::Tier;
use kernel_core::Timestamp;
use kernel_core::model::hashing::query_preview;

use crate::error::CliError;
use crate::error::CliResult;
use crate::output::invalid_input;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Hard wall-clock ceiling on a single `route` call (`spec.md` §5).
const ROUTE_CEILING: Duration = Duration::from_millis(200);

// ============================================================================
// SECTION: Routed Result
// ============================================================================

/// Outcome of [`route_with_ceiling`]: the decision, plus whether the
/// fallback path produced it.
pub struct Routed {
    /// The decision, from either the full pipeline or the fallback.
    pub decision: Decision,
    /// Whether the ceiling was exceeded and the fallback selector ran.
    pub fallback_used: bool,
}

// ============================================================================
// SECTION: Ceiling-Wrapped Routing
// ============================================================================

/// Routes `request` against `baselines`/`history`, falling back to a
/// rule-based tier selection if the full pipeline does not finish within
/// [`ROUTE_CEILING`].
///
/// # Errors
///
/// Returns a [`CliError`] if the query is empty, or if the blocking task
/// driving the full pipeline panics.
pub async fn route_with_ceiling(request: RouteRequest, baselines: Baselines, history: Vec<HistoricalQuery>, sequence: u64, wall_unix_ms: i64) -> CliResult<Routed> {
    let router = Router::default();
    let task_request = request.clone();
    let task_baselines = baselines.clone();
    let handle = tokio::task::spawn_blocking(move || router.route(&task_request, &task_baselines, &history, sequence, wall_unix_ms));

    match tokio::time::timeout(ROUTE_CEILING, handle).await {
        Ok(Ok(Ok(decision))) => Ok(Routed {
            decision,
            fallback_used: false,
        }),
        Ok(Ok(Err(router_err))) => Err(invalid_input(router_err.to_string())),
        Ok(Err(join_err)) => Err(CliError::InvalidInput(format!("routing task failed: {join_err}"))),
        Err(_elapsed) => {
            if request.query.trim().is_empty() {
                return Err(invalid_input("query must not be empty"));
            }
            Ok(Routed {
                decision: fallback_route(&request, &baselines, sequence, wall_unix_ms),
                fallback_used: true,
            })
        }
    }
}

/// Picks a tier directly from `complexity_thresholds`, skipping the
/// three-tier DQ comparison `Router::route` otherwise performs.
fn fallback_route(request: &RouteRequest, baselines: &Baselines, sequence: u64, wall_unix_ms: i64) -> Decision {
    let estimate = ComplexityAnalyzer.estimate(&request.query, &[]);
    let chosen_tier = request.override_tier.unwrap_or_else(|| baselines.ideal_tier(estimate.score));

    let dq = DqScorer::default().score(&request.query, estimate.score, chosen_tier, &[], baselines);
    let dq_breakdown = DqBreakdown {
        total: dq.total,
        validity: dq.validity,
        specificity: dq.specificity,
        correctness: dq.correctness,
    };
    let cost = baselines.cost_for(chosen_tier);

    Decision {
        id: DecisionId::new(),
        ts: Timestamp::new(sequence, wall_unix_ms),
        query_hash: QueryHash::of(&request.query),
        query_preview: query_preview(&request.query),
        complexity: estimate.score,
        complexity_rationale: format!("fallback (ceiling exceeded): {}", estimate.rationale),
        chosen_tier,
        dq: dq_breakdown,
        alternatives: vec![Alternative {
            tier: chosen_tier,
            dq: dq_breakdown,
        }],
        cost_estimate: (100.0 * cost.input + 500.0 * cost.output) / 1_000_000.0,
        baseline_version: baselines.version.clone(),
        session_id: request.session_id.clone(),
        overridden: request.override_tier.is_some(),
        outcome: None,
        feedback_ts: None,
    }
}
