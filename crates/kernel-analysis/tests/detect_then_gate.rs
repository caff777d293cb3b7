// crates/kernel-analysis/tests/detect_then_gate.rs
// ============================================================================
// Module: Detect-Then-Gate Tests
// Description: Feeds PatternDetector output through AutoUpdateGate against a
// real BaselineStore, exercising the full propose -> gate -> apply path.
// Purpose: Cover the cross-crate sequence spec.md §4.7/§4.8 describe, which
// each crate's own unit tests only exercise in isolation.
// Dependencies: kernel-analysis, kernel-baselines, kernel-core, tempfile
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

use kernel_analysis::ApplyResult;
use kernel_analysis::AutoUpdateGate;
use kernel_analysis::GateContext;
use kernel_analysis::PatternDetector;
use kernel_baselines::BaselineStore;
use kernel_core::Alternative;
use kernel_core::Baselines;
use kernel_core::Decision;
use kernel_core::DecisionId;
use kernel_core::DqBreakdown;
use kernel_core::Outcome;
use kernel_core::QueryHash;
use kernel_core::Tier;
use kernel_core::Timestamp;
use tempfile::tempdir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn decision(sequence: u64, tier: Tier, complexity: f64, outcome: Option<Outcome>) -> Decision {
    Decision {
        id: DecisionId::new(),
        ts: Timestamp::new(sequence, 0),
        query_hash: QueryHash::of("q"),
        query_preview: "q".to_string(),
        complexity,
        complexity_rationale: String::new(),
        chosen_tier: tier,
        dq: DqBreakdown {
            total: 0.8,
            validity: 1.0,
            specificity: 1.0,
            correctness: 0.5,
        },
        alternatives: vec![Alternative {
            tier,
            dq: DqBreakdown {
                total: 0.8,
                validity: 1.0,
                specificity: 1.0,
                correctness: 0.5,
            },
        }],
        cost_estimate: 0.01,
        baseline_version: "1.0.0".to_string(),
        session_id: None,
        overridden: false,
        outcome,
        feedback_ts: None,
    }
}

fn struggling_fast_tier_decisions() -> Vec<Decision> {
    (0..42u64)
        .map(|i| {
            let outcome = if i < 40 { Outcome::Failure } else { Outcome::Success };
            decision(i, Tier::Fast, 0.1, Some(outcome))
        })
        .collect()
}

fn permissive_ctx(gates: &kernel_core::FeedbackGates) -> GateContext {
    GateContext {
        total_queries_all_time: gates.min_queries,
        feedback_count: gates.min_feedback,
        data_quality: gates.min_data_quality,
        recent_window_efficiency: 0.95,
        full_window_efficiency: 0.95,
        performance_target: 0.8,
        updates_in_current_window: 0,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn a_detected_proposal_applies_cleanly_through_a_permissive_gate() {
    let dir = tempdir().expect("tempdir");
    let store = BaselineStore::new(dir.path());
    let baselines = store.load();

    let decisions = struggling_fast_tier_decisions();
    let proposals = PatternDetector.detect(&decisions, &baselines, 0);
    let proposal = proposals.iter().find(|p| p.target_path == "complexity_thresholds.fast_hi").expect("a fast_hi proposal");

    let gate = AutoUpdateGate::new(&store);
    let ctx = permissive_ctx(&baselines.feedback_gates);
    let result = gate.apply(proposal, &ctx, false).expect("apply does not error");

    match result {
        ApplyResult::Applied(applied) => {
            assert!(applied.complexity_thresholds.fast_hi < baselines.complexity_thresholds.fast_hi);
            assert_eq!(store.load(), applied);
        }
        other => panic!("expected an applied result, got {other:?}"),
    }
}

#[test]
fn the_same_proposal_is_rejected_when_usage_gates_are_unmet() {
    let dir = tempdir().expect("tempdir");
    let store = BaselineStore::new(dir.path());
    let baselines = store.load();

    let decisions = struggling_fast_tier_decisions();
    let proposals = PatternDetector.detect(&decisions, &baselines, 0);
    let proposal = proposals.iter().find(|p| p.target_path == "complexity_thresholds.fast_hi").expect("a fast_hi proposal");

    let gate = AutoUpdateGate::new(&store);
    let mut ctx = permissive_ctx(&baselines.feedback_gates);
    ctx.total_queries_all_time = 0;
    let result = gate.apply(proposal, &ctx, false).expect("apply does not error");

    match result {
        ApplyResult::GatesUnmet(unmet) => {
            assert!(unmet.contains(&"total_queries_all_time"));
        }
        other => panic!("expected GatesUnmet, got {other:?}"),
    }
    assert_eq!(store.load(), Baselines::defaults(), "a rejected proposal must not touch the store");
}

#[test]
fn rollback_after_apply_restores_the_prior_threshold() {
    let dir = tempdir().expect("tempdir");
    let store = BaselineStore::new(dir.path());
    let baselines = store.load();
    let original_fast_hi = baselines.complexity_thresholds.fast_hi;

    let decisions = struggling_fast_tier_decisions();
    let proposals = PatternDetector.detect(&decisions, &baselines, 0);
    let proposal = proposals.iter().find(|p| p.target_path == "complexity_thresholds.fast_hi").expect("a fast_hi proposal");

    let gate = AutoUpdateGate::new(&store);
    let ctx = permissive_ctx(&baselines.feedback_gates);
    gate.apply(proposal, &ctx, false).expect("apply");

    let restored = gate.rollback(&baselines.version).expect("rollback");
    assert_eq!(restored.complexity_thresholds.fast_hi, original_fast_hi);
}
