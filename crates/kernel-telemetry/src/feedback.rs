// kernel-telemetry/src/feedback.rs
// ============================================================================
// Module: Feedback Ingest
// Description: Resolves outcome signals against the store and sweeps stale
// open decisions into unknown_timeout.
// Purpose: Implement FeedbackIngest (spec.md §4.6): record success/failure,
// mint escalations, and apply the default grace-period timeout.
// Dependencies: kernel-core, kernel-telemetry::store
// ============================================================================

//! ## Overview
//! `FeedbackIngest` sits in front of [`TelemetryStore`] and interprets an
//! [`OutcomeSignal`]'s `signal` field: `Success`/`Failure` attach a terminal
//! [`Outcome`] directly, while `Escalation` does not resolve the original
//! decision by itself — the caller must follow up with
//! [`FeedbackIngest::record_escalation`] once the retry's new decision id is
//! known, since escalation and the new routing decision are produced by two
//! separate calls into the kernel (`spec.md` §4.6, §7).

// ============================================================================
// SECTION: Imports
// ============================================================================

use kernel_core::DecisionId;
use kernel_core::EscalationEvent;
use kernel_core::EscalationReason;
use kernel_core::Outcome;
use kernel_core::OutcomeSignal;
use kernel_core::SignalKind;
use kernel_core::Timestamp;

use crate::store::AttachedOutcome;
use crate::store::DecisionFilter;
use crate::store::TelemetryError;
use crate::store::TelemetryStore;

/// Default grace period before an unresolved decision is swept to
/// `unknown_timeout` (`spec.md` §4.6): 24 hours.
pub const DEFAULT_GRACE_PERIOD_MS: i64 = 24 * 60 * 60 * 1000;

// ============================================================================
// SECTION: Feedback Ingest
// ============================================================================

/// Resolves caller-submitted outcome signals against a [`TelemetryStore`].
pub struct FeedbackIngest<'a> {
    store: &'a TelemetryStore,
}

impl<'a> FeedbackIngest<'a> {
    /// Wraps `store` for feedback resolution.
    #[must_use]
    pub const fn new(store: &'a TelemetryStore) -> Self {
        Self {
            store,
        }
    }

    /// Records an ordinary (non-escalation) outcome signal.
    ///
    /// An `Escalation` signal with no companion
    /// [`Self::record_escalation`] call simply marks the original decision
    /// `Failure`: the tier it chose did not resolve the request, regardless
    /// of whether the caller went on to retry elsewhere (`spec.md` §4.6).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError`] when the target cannot be resolved or the
    /// store cannot be written.
    pub fn record(&self, signal: &OutcomeSignal) -> Result<AttachedOutcome, TelemetryError> {
        let outcome = match signal.signal {
            SignalKind::Success => Outcome::Success,
            SignalKind::Failure | SignalKind::Escalation => Outcome::Failure,
        };
        self.store.attach_outcome(&signal.target, outcome, signal.observed_at_unix_ms, LATEST_BASELINE_PLACEHOLDER)
    }

    /// Records an explicit escalation link once the retry's new decision id
    /// is known, marking the original decision `Failure` and persisting an
    /// [`EscalationEvent`] (`spec.md` §4.6, §9).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError`] when the original decision cannot be
    /// resolved or the store cannot be written.
    pub fn record_escalation(&self, original: DecisionId, new_decision_id: DecisionId, reason: EscalationReason, wall_unix_ms: i64, baseline_version: &str) -> Result<(), TelemetryError> {
        self.store.attach_outcome(&kernel_core::SignalTarget::DecisionId(original), Outcome::Failure, wall_unix_ms, baseline_version)?;
        self.store.record_escalation(
            EscalationEvent {
                original_decision_id: original,
                new_decision_id,
                reason,
                ts: Timestamp::new(0, wall_unix_ms),
            },
            baseline_version,
        )
    }

    /// Marks every still-open decision older than `grace_period_ms` as
    /// `unknown_timeout`, returning the ids swept. Intended to run
    /// periodically (`spec.md` §4.6).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError`] when the store cannot be read or written.
    pub fn sweep_unknown_timeouts(&self, now_unix_ms: i64, grace_period_ms: i64, baseline_version: &str) -> Result<Vec<DecisionId>, TelemetryError> {
        let open = self.store.query_decisions(&DecisionFilter {
            tier: None,
            terminal_only: false,
            limit: None,
        })?;

        let mut swept = Vec::new();
        for decision in open.into_iter().filter(|d| d.outcome.is_none()) {
            let age_ms = now_unix_ms - decision.ts.wall_unix_ms;
            if age_ms < grace_period_ms {
                continue;
            }
            self.store.attach_outcome(&kernel_core::SignalTarget::DecisionId(decision.id), Outcome::UnknownTimeout, now_unix_ms, baseline_version)?;
            swept.push(decision.id);
        }
        Ok(swept)
    }
}

/// Placeholder baseline version for signals that do not carry their own
/// (the attached outcome does not itself depend on which baseline was
/// active; only the originating decision does).
const LATEST_BASELINE_PLACEHOLDER: &str = "unknown";

#[cfg(test)]
mod tests {
    use kernel_core::Alternative;
    use kernel_core::Decision;
    use kernel_core::DecisionId;
    use kernel_core::DqBreakdown;
    use kernel_core::EscalationReason;
    use kernel_core::OutcomeSignal;
    use kernel_core::QueryHash;
    use kernel_core::SignalKind;
    use kernel_core::SignalTarget;
    use kernel_core::Tier;
    use kernel_core::Timestamp;
    use tempfile::tempdir;

    use super::FeedbackIngest;
    use crate::store::TelemetryStore;

    fn decision(id: DecisionId, wall_unix_ms: i64) -> Decision {
        Decision {
            id,
            ts: Timestamp::new(1, wall_unix_ms),
            query_hash: QueryHash::of("q"),
            query_preview: "q".to_string(),
            complexity: 0.5,
            complexity_rationale: String::new(),
            chosen_tier: Tier::Fast,
            dq: DqBreakdown {
                total: 0.8,
                validity: 1.0,
                specificity: 1.0,
                correctness: 0.5,
            },
            alternatives: vec![Alternative {
                tier: Tier::Fast,
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
            outcome: None,
            feedback_ts: None,
        }
    }

    #[test]
    fn success_signal_attaches_success_outcome() {
        let dir = tempdir().expect("tempdir");
        let store = TelemetryStore::open(dir.path()).expect("open");
        let id = DecisionId::new();
        store.append_decision(decision(id, 0)).expect("append");

        let ingest = FeedbackIngest::new(&store);
        let signal = OutcomeSignal {
            target: SignalTarget::DecisionId(id),
            signal: SignalKind::Success,
            escalation_reason: None,
            observed_at_unix_ms: 100,
        };
        let attached = ingest.record(&signal).expect("record");
        assert_eq!(attached.outcome, kernel_core::Outcome::Success);
    }

    #[test]
    fn escalation_without_followup_marks_original_as_failure() {
        let dir = tempdir().expect("tempdir");
        let store = TelemetryStore::open(dir.path()).expect("open");
        let id = DecisionId::new();
        store.append_decision(decision(id, 0)).expect("append");

        let ingest = FeedbackIngest::new(&store);
        let signal = OutcomeSignal {
            target: SignalTarget::DecisionId(id),
            signal: SignalKind::Escalation,
            escalation_reason: Some(EscalationReason::ExitCode),
            observed_at_unix_ms: 100,
        };
        let attached = ingest.record(&signal).expect("record");
        assert_eq!(attached.outcome, kernel_core::Outcome::Failure);
    }

    #[test]
    fn record_escalation_links_original_to_retry() {
        let dir = tempdir().expect("tempdir");
        let store = TelemetryStore::open(dir.path()).expect("open");
        let original = DecisionId::new();
        let retry = DecisionId::new();
        store.append_decision(decision(original, 0)).expect("append");

        let ingest = FeedbackIngest::new(&store);
        ingest.record_escalation(original, retry, EscalationReason::CapabilityLimitation, 50, "1.0.0").expect("record_escalation");

        let decisions = store.query_decisions(&Default::default()).expect("query");
        assert_eq!(decisions[0].outcome, Some(kernel_core::Outcome::Failure));
    }

    #[test]
    fn sweep_marks_stale_open_decisions_as_unknown_timeout() {
        let dir = tempdir().expect("tempdir");
        let store = TelemetryStore::open(dir.path()).expect("open");
        let id = DecisionId::new();
        store.append_decision(decision(id, 0)).expect("append");

        let ingest = FeedbackIngest::new(&store);
        let swept = ingest.sweep_unknown_timeouts(super::DEFAULT_GRACE_PERIOD_MS + 1, super::DEFAULT_GRACE_PERIOD_MS, "1.0.0").expect("sweep");
        assert_eq!(swept, vec![id]);
    }

    #[test]
    fn sweep_leaves_fresh_open_decisions_alone() {
        let dir = tempdir().expect("tempdir");
        let store = TelemetryStore::open(dir.path()).expect("open");
        let id = DecisionId::new();
        store.append_decision(decision(id, 0)).expect("append");

        let ingest = FeedbackIngest::new(&store);
        let swept = ingest.sweep_unknown_timeouts(1000, super::DEFAULT_GRACE_PERIOD_MS, "1.0.0").expect("sweep");
        assert!(swept.is_empty());
    }
}
