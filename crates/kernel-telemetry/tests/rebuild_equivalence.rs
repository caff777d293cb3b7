// crates/kernel-telemetry/tests/rebuild_equivalence.rs
// ============================================================================
// Module: Aggregate Rebuild Equivalence Tests
// Description: Checks that rebuilding Aggregates from the event log matches
// the live, incrementally-updated Aggregates at a quiescent point.
// Purpose: Cover spec.md §8 invariant 6 end-to-end through TelemetryStore,
// not just Aggregates::rebuild in isolation.
// Dependencies: kernel-core, kernel-telemetry, tempfile
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

use kernel_core::Alternative;
use kernel_core::Decision;
use kernel_core::DecisionId;
use kernel_core::DqBreakdown;
use kernel_core::Outcome;
use kernel_core::QueryHash;
use kernel_core::SignalTarget;
use kernel_core::Tier;
use kernel_core::Timestamp;
use kernel_telemetry::TelemetryStore;
use tempfile::tempdir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn decision(id: DecisionId, sequence: u64, tier: Tier, dq_total: f64, wall_unix_ms: i64) -> Decision {
    let dq = DqBreakdown {
        total: dq_total,
        validity: 1.0,
        specificity: 1.0,
        correctness: dq_total,
    };
    Decision {
        id,
        ts: Timestamp::new(sequence, wall_unix_ms),
        query_hash: QueryHash::of("sample query"),
        query_preview: "sample query".to_string(),
        complexity: 0.4,
        complexity_rationale: String::new(),
        chosen_tier: tier,
        dq,
        alternatives: vec![Alternative {
            tier,
            dq,
        }],
        cost_estimate: 0.02,
        baseline_version: "1.0.0".to_string(),
        session_id: None,
        overridden: false,
        outcome: None,
        feedback_ts: None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn rebuild_from_events_matches_live_aggregates_after_mixed_activity() {
    let dir = tempdir().expect("tempdir");
    let store = TelemetryStore::open(dir.path()).expect("open");

    let ids: Vec<DecisionId> = (0..6).map(|_| DecisionId::new()).collect();
    let tiers = [Tier::Fast, Tier::Fast, Tier::Medium, Tier::Medium, Tier::Strong, Tier::Strong];
    for (i, id) in ids.iter().enumerate() {
        store.append_decision(decision(*id, i as u64 + 1, tiers[i], 0.6 + 0.05 * i as f64, i as i64 * 1000)).expect("append");
    }

    store.attach_outcome(&SignalTarget::DecisionId(ids[0]), Outcome::Success, 7000, "1.0.0").expect("attach");
    store.attach_outcome(&SignalTarget::DecisionId(ids[1]), Outcome::Failure, 7100, "1.0.0").expect("attach");
    store.attach_outcome(&SignalTarget::DecisionId(ids[2]), Outcome::Success, 7200, "1.0.0").expect("attach");
    store.attach_outcome(&SignalTarget::DecisionId(ids[4]), Outcome::UnknownTimeout, 7300, "1.0.0").expect("attach");

    let live = store.live_aggregates().expect("live aggregates");
    let rebuilt = store.rebuild_from_events().expect("rebuild from events");

    assert_eq!(live.decisions_newest_first().len(), rebuilt.decisions_newest_first().len());
    assert_eq!(live, rebuilt);
}

#[test]
fn stats_over_a_bounded_window_only_considers_the_most_recent_entries() {
    let dir = tempdir().expect("tempdir");
    let store = TelemetryStore::open(dir.path()).expect("open");

    for i in 0..5 {
        let id = DecisionId::new();
        store.append_decision(decision(id, i + 1, Tier::Fast, 0.9, i as i64 * 10)).expect("append");
        store.attach_outcome(&SignalTarget::DecisionId(id), Outcome::Success, i as i64 * 10 + 1, "1.0.0").expect("attach");
    }
    for i in 5..8 {
        let id = DecisionId::new();
        store.append_decision(decision(id, i + 1, Tier::Fast, 0.9, i as i64 * 10)).expect("append");
        store.attach_outcome(&SignalTarget::DecisionId(id), Outcome::Failure, i as i64 * 10 + 1, "1.0.0").expect("attach");
    }

    let windowed = store.stats(Some(3)).expect("windowed stats");
    let full = store.stats(None).expect("full stats");

    assert_ne!(windowed.total_decisions, full.total_decisions);
    assert_eq!(windowed.total_decisions, 3);
    assert_eq!(full.total_decisions, 8);
}
