// crates/kernel-core/tests/routing_with_history.rs
// ============================================================================
// Module: Routing With History Tests
// Description: Exercises Router end-to-end against a HistoricalQuery
// snapshot, checking that past outcomes shift tier selection.
// Purpose: Cover the cross-module path spec.md §4.3-§4.5 describes, which no
// single unit test inside router.rs reaches on its own.
// Dependencies: kernel-core
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use kernel_core::Baselines;
use kernel_core::HistoricalQuery;
use kernel_core::Outcome;
use kernel_core::RouteRequest;
use kernel_core::Router;
use kernel_core::RouterError;
use kernel_core::Tier;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn request(query: &str) -> RouteRequest {
    RouteRequest {
        query: query.to_string(),
        session_id: None,
        override_tier: None,
    }
}

fn historical(query: &str, tier: Tier, dq_total: f64, outcome: Outcome) -> HistoricalQuery {
    HistoricalQuery {
        query: query.to_string(),
        complexity: 0.5,
        tier,
        dq_total,
        outcome: Some(outcome),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn repeated_failures_on_a_similar_query_depress_its_dq_score() {
    let router = Router::default();
    let baselines = Baselines::defaults();

    let no_history = router.route(&request("summarize this quarterly report"), &baselines, &[], 1, 0).unwrap();

    let failing_history: Vec<HistoricalQuery> = (0..3)
        .map(|_| historical("summarize this quarterly report", Tier::Fast, 0.4, Outcome::Failure))
        .collect();
    let with_history = router
        .route(&request("summarize this quarterly report"), &baselines, &failing_history, 2, 0)
        .unwrap();

    assert!(
        with_history.dq.total <= no_history.dq.total,
        "expected history of failures to not improve DQ: {} vs {}",
        with_history.dq.total,
        no_history.dq.total
    );
}

#[test]
fn override_tier_bypasses_scoring_and_is_recorded_as_overridden() {
    let router = Router::default();
    let baselines = Baselines::defaults();
    let mut req = request("hi");
    req.override_tier = Some(Tier::Strong);

    let decision = router.route(&req, &baselines, &[], 1, 0).unwrap();

    assert_eq!(decision.chosen_tier, Tier::Strong);
    assert!(decision.overridden);
    assert_eq!(decision.alternatives.len(), 3);
}

#[test]
fn decision_carries_the_baseline_version_it_was_scored_against() {
    let router = Router::default();
    let mut baselines = Baselines::defaults();
    baselines.version = "2.3.0".to_string();

    let decision = router.route(&request("what is the capital of France"), &baselines, &[], 1, 0).unwrap();

    assert_eq!(decision.baseline_version, "2.3.0");
}

#[test]
fn blank_query_is_rejected_before_any_scoring_happens() {
    let router = Router::default();
    let baselines = Baselines::defaults();

    let err = router.route(&request("\n\t  "), &baselines, &[], 1, 0).unwrap_err();

    assert_eq!(err, RouterError::EmptyQuery);
}
