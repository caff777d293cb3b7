// kernel-analysis/src/gate.rs
// ============================================================================
// Module: Auto-Update Gate
// Description: Validates ProposedUpdates against usage/quality/stability
// gates before applying, previewing, or rolling them back.
// Purpose: Implement AutoUpdateGate (spec.md §4.8): Evaluate, Apply, Rollback,
// plus the post-apply regression monitor.
// Dependencies: kernel-core, kernel-baselines
// ============================================================================

//! ## Overview
//! Gate predicates read their thresholds from `baselines.feedback_gates`
//! (`spec.md` §3), unlike `PatternDetector`'s own internal tuning constants
//! — the gate's thresholds are explicitly named as `Baselines` fields in
//! `spec.md` §3's enumeration, so they belong there. `GatesUnmet` and
//! `ValidationFailed` are modelled as ordinary return values rather than
//! errors, per `spec.md` §7: "expected outcomes, not errors."

// ============================================================================
// SECTION: Imports
// ============================================================================

use kernel_baselines::ApplyOutcome;
use kernel_baselines::BaselineStore;
use kernel_baselines::StoreError;
use kernel_core::Baselines;
use kernel_core::Decision;
use kernel_core::FeedbackGates;
use kernel_core::Outcome;
use kernel_core::ProposedUpdate;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure modes for [`AutoUpdateGate`] that are genuinely exceptional
/// (everything else is a structured [`ApplyResult`] variant).
#[derive(Debug, Error)]
pub enum GateError {
    /// The underlying baseline store could not persist the change.
    #[error("baseline store error: {0}")]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Gate Context
// ============================================================================

/// The usage/quality/performance measurements a gate evaluation needs,
/// computed by the caller from telemetry aggregates (`spec.md` §4.8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateContext {
    /// Total decisions ever recorded.
    pub total_queries_all_time: u64,
    /// Total outcome signals ever attached.
    pub feedback_count: u64,
    /// Overall data-quality score (`spec.md` §4.8).
    pub data_quality: f64,
    /// Efficiency over the most recent `feedback_gates.recent_sample` decisions.
    pub recent_window_efficiency: f64,
    /// Efficiency over the full window.
    pub full_window_efficiency: f64,
    /// The performance target both windows are compared against.
    pub performance_target: f64,
    /// Applied updates within the current `feedback_gates.update_window_queries`.
    pub updates_in_current_window: u32,
}

/// One unmet gate predicate, named for explainability in a [`GateReport`].
pub type UnmetGate = &'static str;

/// Result of evaluating a proposal's gates (`spec.md` §4.8).
#[derive(Debug, Clone, PartialEq)]
pub enum GateReport {
    /// Every predicate holds; the proposal may be applied.
    Eligible,
    /// At least one predicate failed; lists which ones.
    Unmet(Vec<UnmetGate>),
}

impl GateReport {
    /// Whether every predicate held.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Evaluates all gate predicates (`spec.md` §4.8): all must hold to auto-apply.
#[must_use]
pub fn evaluate(ctx: &GateContext, gates: &FeedbackGates) -> GateReport {
    let mut unmet = Vec::new();

    if ctx.total_queries_all_time < gates.min_queries {
        unmet.push("total_queries_all_time");
    }
    if ctx.feedback_count < gates.min_feedback {
        unmet.push("feedback_count");
    }
    if ctx.data_quality < gates.min_data_quality {
        unmet.push("data_quality");
    }
    if ctx.recent_window_efficiency < ctx.performance_target {
        unmet.push("recent_window_performance_target");
    }
    if ctx.full_window_efficiency < ctx.performance_target {
        unmet.push("full_window_performance_target");
    }
    if ctx.updates_in_current_window >= gates.max_updates_per_window {
        unmet.push("updates_in_current_window");
    }

    if unmet.is_empty() { GateReport::Eligible } else { GateReport::Unmet(unmet) }
}

// ============================================================================
// SECTION: Apply Result
// ============================================================================

/// Result of [`AutoUpdateGate::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyResult {
    /// Gates were not met; the proposal remains `proposed` (non-fatal).
    GatesUnmet(Vec<UnmetGate>),
    /// `dry_run = true`: the candidate Baselines that would be written.
    Preview(Baselines),
    /// `dry_run = false`: the candidate was persisted and is now current.
    Applied(Baselines),
}

// ============================================================================
// SECTION: Auto-Update Gate
// ============================================================================

/// Validates and applies [`ProposedUpdate`]s against a [`BaselineStore`]
/// (`spec.md` §4.8).
pub struct AutoUpdateGate<'a> {
    baselines_store: &'a BaselineStore,
}

impl<'a> AutoUpdateGate<'a> {
    /// Wraps `baselines_store` for gate evaluation and application.
    #[must_use]
    pub const fn new(baselines_store: &'a BaselineStore) -> Self {
        Self {
            baselines_store,
        }
    }

    /// Evaluates `proposal`'s gates; `dry_run` previews always bypass gate
    /// evaluation (a preview is informational, not a commitment — `spec.md`
    /// §4.8 only requires gates before a non-dry-run apply).
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Store`] when persistence fails.
    pub fn apply(&self, proposal: &ProposedUpdate, ctx: &GateContext, dry_run: bool) -> Result<ApplyResult, GateError> {
        let baselines = self.baselines_store.load();

        if !dry_run {
            let report = evaluate(ctx, &baselines.feedback_gates);
            if let GateReport::Unmet(unmet) = report {
                return Ok(ApplyResult::GatesUnmet(unmet));
            }
        }

        match self.baselines_store.apply_update(proposal, dry_run)? {
            ApplyOutcome::Preview {
                proposed, ..
            } => Ok(ApplyResult::Preview(proposed)),
            ApplyOutcome::Applied(applied) => Ok(ApplyResult::Applied(applied)),
        }
    }

    /// Reverts to `version`, used both for an operator-issued `rollback`
    /// command and for the auto-rollback monitor (`spec.md` §4.8).
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Store`] when `version` has no stored file or
    /// persistence fails.
    pub fn rollback(&self, version: &str) -> Result<Baselines, GateError> {
        Ok(self.baselines_store.rollback(version)?)
    }
}

// ============================================================================
// SECTION: Regression Monitor
// ============================================================================

/// Computes efficiency (success rate among resolved decisions) over a
/// decision slice, for comparing pre- and post-apply windows.
#[must_use]
pub fn window_efficiency(decisions: &[Decision]) -> f64 {
    let resolved: Vec<&Decision> = decisions.iter().filter(|d| d.outcome.is_some()).collect();
    if resolved.is_empty() {
        return 1.0;
    }
    let successes = resolved.iter().filter(|d| matches!(d.outcome, Some(Outcome::Success))).count();
    successes as f64 / resolved.len() as f64
}

/// Whether the post-apply efficiency over `recent_decisions` has dropped by
/// more than `rollback_drop_pct` relative to `pre_apply_efficiency`
/// (`spec.md` §4.8's auto-rollback monitor).
#[must_use]
pub fn regression_detected(pre_apply_efficiency: f64, recent_decisions: &[Decision], rollback_drop_pct: f64) -> bool {
    if pre_apply_efficiency <= 0.0 {
        return false;
    }
    let post_apply_efficiency = window_efficiency(recent_decisions);
    let relative_drop = (pre_apply_efficiency - post_apply_efficiency) / pre_apply_efficiency;
    relative_drop > rollback_drop_pct
}
