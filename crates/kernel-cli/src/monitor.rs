// kernel-cli/src/monitor.rs
// ============================================================================
// Module: Auto-Rollback Monitor
// Description: Detects a post-apply efficiency regression and reverts the
// responsible proposal.
// Purpose: Implement the auto-rollback monitor (spec.md §4.8, §8 scenario 6):
// once recent_sample decisions have landed since the last applied proposal,
// compare their efficiency against the pre-apply window and roll back on a
// drop exceeding rollback_drop_pct.
// Dependencies: kernel-analysis, kernel-baselines, kernel-core,
// kernel-telemetry
// ============================================================================

//! ## Overview
//! There is no background scheduler here (`spec.md` §6: an operator CLI, not
//! a daemon) to run this on a timer. `feedback` is the command that turns an
//! unresolved decision into one `window_efficiency` counts, so `check` is
//! called once at the end of every `feedback` invocation — it is the only
//! point at which the post-apply window's efficiency can have changed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use kernel_analysis::AutoUpdateGate;
use kernel_analysis::regression_detected;
use kernel_analysis::window_efficiency;
use kernel_core::Baselines;
use kernel_core::ProposalStatus;
use kernel_telemetry::DecisionFilter;

use crate::context::Context;
use crate::error::CliResult;

// ============================================================================
// SECTION: Auto-Rollback Outcome
// ============================================================================

/// Recorded once the monitor auto-reverts a proposal.
#[derive(Debug, Clone)]
pub struct AutoRollback {
    /// The proposal that was reverted.
    pub proposal_id: String,
    /// Baseline version restored.
    pub reverted_to_version: String,
    /// The restored baselines.
    pub restored: Baselines,
}

// ============================================================================
// SECTION: Check
// ============================================================================

/// Re-evaluates the most recently applied (and not yet settled) proposal's
/// monitoring window, reverting it if a regression is detected.
///
/// # Errors
///
/// Returns a [`crate::error::CliError`] if any underlying store cannot be
/// read or written.
pub fn check(ctx: &Context) -> CliResult<Option<AutoRollback>> {
    let baselines = ctx.baselines.load();
    let gates = baselines.feedback_gates;
    let lineage = baselines.lineage;

    let Some((idx, entry)) = lineage.iter().enumerate().rev().find(|(_, entry)| entry.proposal_id.is_some()) else {
        return Ok(None);
    };
    let proposal_id = entry.proposal_id.clone().unwrap_or_default();

    let still_applied = ctx.proposals.find(&proposal_id)?.is_some_and(|proposal| proposal.status == ProposalStatus::Applied);
    if !still_applied {
        return Ok(None);
    }

    let pre_apply_version = idx
        .checked_sub(1)
        .and_then(|prior_idx| lineage.get(prior_idx))
        .map_or_else(|| Baselines::defaults().version, |prior| prior.version.clone());

    let all = ctx.telemetry.query_decisions(&DecisionFilter::default())?;
    let pre_apply: Vec<_> = all.iter().filter(|decision| decision.ts.wall_unix_ms < entry.applied_at_unix_ms).cloned().collect();
    let post_apply: Vec<_> = all.iter().filter(|decision| decision.ts.wall_unix_ms >= entry.applied_at_unix_ms).cloned().collect();

    if (post_apply.len() as u64) < gates.recent_sample {
        return Ok(None);
    }

    let pre_apply_efficiency = window_efficiency(&pre_apply);
    if !regression_detected(pre_apply_efficiency, &post_apply, gates.rollback_drop_pct) {
        return Ok(None);
    }

    let gate = AutoUpdateGate::new(&ctx.baselines);
    let restored = gate.rollback(&pre_apply_version)?;
    ctx.proposals.set_status(&proposal_id, ProposalStatus::RolledBack)?;

    Ok(Some(AutoRollback {
        proposal_id,
        reverted_to_version: pre_apply_version,
        restored,
    }))
}
