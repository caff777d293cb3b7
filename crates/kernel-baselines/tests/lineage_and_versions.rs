// crates/kernel-baselines/tests/lineage_and_versions.rs
// ============================================================================
// Module: Baseline Lineage And Version Inspection Tests
// Description: Exercises BaselineStore across several applies, checking
// lineage growth and historical-version reads.
// Purpose: Cover the cross-call sequence spec.md §4.1/§6 describes (apply,
// apply again, inspect an old version, inspect lineage) that no single
// in-module test reaches.
// Dependencies: kernel-baselines, kernel-core, tempfile
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

use kernel_baselines::ApplyOutcome;
use kernel_baselines::BaselineStore;
use kernel_core::ProposalId;
use kernel_core::ProposalStatus;
use kernel_core::ProposalType;
use kernel_core::ProposedUpdate;
use serde_json::json;
use tempfile::tempdir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn update(version: &str, target_path: &str, proposed: serde_json::Value) -> ProposedUpdate {
    ProposedUpdate {
        id: ProposalId::new(1, 0),
        kind: ProposalType::ThresholdAdjustment,
        target_path: target_path.to_string(),
        current_value: json!(null),
        proposed_value: proposed,
        rationale: "integration test update".to_string(),
        sample_size: 10,
        confidence: 0.75,
        status: ProposalStatus::Proposed,
        parent_baseline_version: version.to_string(),
    }
}

fn applied(outcome: ApplyOutcome) -> kernel_core::Baselines {
    match outcome {
        ApplyOutcome::Applied(baselines) => baselines,
        ApplyOutcome::Preview {
            ..
        } => panic!("expected an applied outcome, got a preview"),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn three_successive_applies_each_grow_lineage_by_one() {
    let dir = tempdir().expect("tempdir");
    let store = BaselineStore::new(dir.path());
    let v0 = store.load();

    let v1 = applied(store.apply_update(&update(&v0.version, "complexity_thresholds.fast_hi", json!(0.22)), false).expect("apply 1"));
    let v2 = applied(store.apply_update(&update(&v1.version, "dq_weights.validity", json!(0.4)), false).expect("apply 2"));
    let v3 = applied(store.apply_update(&update(&v2.version, "actionable_threshold", json!(0.65)), false).expect("apply 3"));

    assert_eq!(v1.lineage.len(), v0.lineage.len() + 1);
    assert_eq!(v2.lineage.len(), v0.lineage.len() + 2);
    assert_eq!(v3.lineage.len(), v0.lineage.len() + 3);
    assert_eq!(store.load(), v3);
}

#[test]
fn load_version_reads_a_superseded_version_without_disturbing_current() {
    let dir = tempdir().expect("tempdir");
    let store = BaselineStore::new(dir.path());
    let v0 = store.load();

    let v1 = applied(store.apply_update(&update(&v0.version, "complexity_thresholds.fast_hi", json!(0.19)), false).expect("apply succeeds"));
    assert_ne!(v1.version, v0.version);

    let reread_v0 = store.load_version(&v0.version).expect("v0 file still exists");
    assert_eq!(reread_v0.complexity_thresholds, v0.complexity_thresholds);
    assert_eq!(store.load(), v1, "load_version must not change what load() returns");
}

#[test]
fn load_version_of_a_version_never_persisted_fails() {
    let dir = tempdir().expect("tempdir");
    let store = BaselineStore::new(dir.path());
    let err = store.load_version("404.0.0").unwrap_err();
    assert!(matches!(err, kernel_baselines::StoreError::VersionNotFound(_)));
}

#[test]
fn lineage_reflects_applied_proposal_ids() {
    let dir = tempdir().expect("tempdir");
    let store = BaselineStore::new(dir.path());
    let v0 = store.load();
    let proposal = update(&v0.version, "complexity_thresholds.medium_hi", json!(0.72));
    let expected_id = proposal.id.as_str().to_string();

    applied(store.apply_update(&proposal, false).expect("apply succeeds"));

    let lineage = store.lineage();
    let last = lineage.last().expect("lineage has at least one entry");
    assert_eq!(last.proposal_id.as_deref(), Some(expected_id.as_str()));
}
