// kernel-cli/src/gate_context.rs
// ============================================================================
// Module: Gate Context Builder
// Description: Computes AutoUpdateGate's GateContext from telemetry and
// baseline lineage.
// Purpose: AutoUpdateGate performs no IO of its own (spec.md §4.8) and
// expects its caller to hand it pre-computed measurements; the CLI is that
// caller.
// Dependencies: kernel-analysis, kernel-baselines, kernel-telemetry
// ============================================================================

use kernel_analysis::GateContext;
use kernel_analysis::window_efficiency;
use kernel_baselines::BaselineStore;
use kernel_telemetry::DecisionFilter;
use kernel_telemetry::TelemetryStore;

use crate::error::CliResult;

/// Builds a [`GateContext`] from the live telemetry and baseline stores.
///
/// `full_window_efficiency` and `recent_window_efficiency` both measure
/// success rate among resolved decisions; the recent window is capped at
/// `recent_sample` decisions, newest first. `updates_in_current_window`
/// counts applied auto-updates recorded in the current baseline's lineage —
/// an approximation of a query-indexed window, since lineage itself is not
/// query-indexed (`DESIGN.md` records this as an open-question resolution).
///
/// # Errors
///
/// Returns a [`crate::error::CliError::Telemetry`] if the telemetry store
/// cannot be queried.
pub fn build(telemetry: &TelemetryStore, baselines: &BaselineStore, recent_sample: u64) -> CliResult<GateContext> {
    let all = telemetry.query_decisions(&DecisionFilter::default())?;
    let terminal = telemetry.query_decisions(&DecisionFilter {
        terminal_only: true,
        ..DecisionFilter::default()
    })?;

    let current = baselines.load();
    let recent: Vec<_> = all.iter().take(recent_sample as usize).cloned().collect();

    Ok(GateContext {
        total_queries_all_time: all.len() as u64,
        feedback_count: terminal.len() as u64,
        data_quality: average_dq(&all),
        recent_window_efficiency: window_efficiency(&recent),
        full_window_efficiency: window_efficiency(&all),
        performance_target: current.actionable_threshold,
        updates_in_current_window: current.lineage.iter().filter(|entry| entry.proposal_id.is_some()).count() as u32,
    })
}

fn average_dq(decisions: &[kernel_core::Decision]) -> f64 {
    if decisions.is_empty() {
        return 0.0;
    }
    let sum: f64 = decisions.iter().map(|decision| decision.dq.total).sum();
    sum / decisions.len() as f64
}

#[cfg(test)]
mod tests {
    use kernel_baselines::BaselineStore;
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

    use super::build;

    fn decision(sequence: u64, dq_total: f64) -> Decision {
        let dq = DqBreakdown {
            total: dq_total,
            validity: 1.0,
            specificity: 1.0,
            correctness: dq_total,
        };
        Decision {
            id: DecisionId::new(),
            ts: Timestamp::new(sequence, 0),
            query_hash: QueryHash::of("q"),
            query_preview: "q".to_string(),
            complexity: 0.3,
            complexity_rationale: String::new(),
            chosen_tier: Tier::Fast,
            dq,
            alternatives: vec![Alternative {
                tier: Tier::Fast,
                dq,
            }],
            cost_estimate: 0.01,
            baseline_version: "1.0.0".to_string(),
            session_id: None,
            overridden: false,
            outcome: None,
            feedback_ts: None,
        }
    }

    #[test]
    fn an_empty_store_yields_a_zeroed_context() {
        let dir = tempdir().expect("tempdir");
        let telemetry = TelemetryStore::open(dir.path().join("events")).expect("open telemetry");
        let baselines = BaselineStore::new(dir.path().join("baselines"));

        let ctx = build(&telemetry, &baselines, 40).expect("build");

        assert_eq!(ctx.total_queries_all_time, 0);
        assert_eq!(ctx.feedback_count, 0);
        assert_eq!(ctx.data_quality, 0.0);
        assert_eq!(ctx.recent_window_efficiency, 1.0, "no resolved decisions defaults to efficiency 1.0");
        assert_eq!(ctx.updates_in_current_window, 0);
    }

    #[test]
    fn feedback_count_only_counts_resolved_decisions() {
        let dir = tempdir().expect("tempdir");
        let telemetry = TelemetryStore::open(dir.path().join("events")).expect("open telemetry");
        let baselines = BaselineStore::new(dir.path().join("baselines"));

        let resolved = decision(1, 0.9);
        let resolved_id = resolved.id;
        let unresolved = decision(2, 0.7);
        telemetry.append_decision(resolved).expect("append");
        telemetry.append_decision(unresolved).expect("append");
        telemetry.attach_outcome(&SignalTarget::DecisionId(resolved_id), Outcome::Success, 10, "1.0.0").expect("attach");

        let ctx = build(&telemetry, &baselines, 40).expect("build");

        assert_eq!(ctx.total_queries_all_time, 2);
        assert_eq!(ctx.feedback_count, 1);
        assert!((ctx.data_quality - 0.8).abs() < 1e-9, "data_quality was {}", ctx.data_quality);
    }

    #[test]
    fn recent_window_is_capped_to_the_requested_sample_size() {
        let dir = tempdir().expect("tempdir");
        let telemetry = TelemetryStore::open(dir.path().join("events")).expect("open telemetry");
        let baselines = BaselineStore::new(dir.path().join("baselines"));

        for i in 0..5u64 {
            let d = decision(i + 1, 0.8);
            let id = d.id;
            telemetry.append_decision(d).expect("append");
            let outcome = if i < 2 { Outcome::Failure } else { Outcome::Success };
            telemetry.attach_outcome(&SignalTarget::DecisionId(id), outcome, 100 + i as i64, "1.0.0").expect("attach");
        }

        let narrow = build(&telemetry, &baselines, 2).expect("build narrow");
        let wide = build(&telemetry, &baselines, 40).expect("build wide");

        assert_eq!(narrow.recent_window_efficiency, 1.0, "the 2 most recent decisions both succeeded");
        assert!(wide.recent_window_efficiency < 1.0, "the full window includes the 2 early failures");
    }
}
