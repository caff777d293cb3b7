// kernel-telemetry/src/aggregates.rs
// ============================================================================
// Module: Telemetry Aggregates
// Description: In-memory indexed view over the raw event log.
// Purpose: Implement the rebuild-from-events / live-aggregates equivalence
// property (spec.md §4.2(c), §8 invariant 6) and the Stats() query
// (spec.md §4.2, §6).
// Dependencies: kernel-core, kernel-telemetry::event
// ============================================================================

//! ## Overview
//! `Aggregates` is a pure projection of a `&[EventEnvelope]` slice: decisions
//! indexed by id, sessions, and escalations, each rebuilt in append order.
//! `TelemetryStore` keeps one live copy updated incrementally; tests assert
//! that [`Aggregates::rebuild`] over the full event log always reproduces it
//! exactly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use kernel_core::Decision;
use kernel_core::DecisionId;
use kernel_core::EscalationEvent;
use kernel_core::Outcome;
use kernel_core::SessionOutcome;
use kernel_core::Tier;

use crate::event::EventEnvelope;
use crate::event::EventPayload;

// ============================================================================
// SECTION: Aggregates
// ============================================================================

/// Indexed, rebuildable view over the telemetry event log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    /// Decisions indexed by id, in append order.
    pub decisions: BTreeMap<DecisionId, Decision>,
    /// Order decisions were first appended, for recency queries.
    pub decision_order: Vec<DecisionId>,
    /// Session outcomes, most recently recorded last.
    pub sessions: Vec<SessionOutcome>,
    /// Escalation links, most recently recorded last.
    pub escalations: Vec<EscalationEvent>,
    /// Highest sequence number observed, for resuming append numbering.
    pub max_sequence: u64,
}

impl Aggregates {
    /// Rebuilds aggregates from scratch by folding every event in order.
    #[must_use]
    pub fn rebuild(events: &[EventEnvelope]) -> Self {
        let mut aggregates = Self::default();
        for event in events {
            aggregates.apply(event);
        }
        aggregates
    }

    /// Applies one event's effect, in place. Shared by `rebuild` and by the
    /// live store's incremental update path, so both paths can never drift
    /// apart in behaviour.
    pub fn apply(&mut self, event: &EventEnvelope) {
        self.max_sequence = self.max_sequence.max(event.sequence);
        match &event.payload {
            EventPayload::DecisionRecorded {
                decision,
            } => {
                if !self.decisions.contains_key(&decision.id) {
                    self.decision_order.push(decision.id);
                }
                self.decisions.insert(decision.id, (**decision).clone());
            }
            EventPayload::OutcomeAttached {
                decision_id,
                outcome,
                feedback_ts,
                ..
            } => {
                if let Some(decision) = self.decisions.get_mut(decision_id) {
                    decision.outcome = Some(*outcome);
                    decision.feedback_ts = Some(*feedback_ts);
                }
            }
            EventPayload::EscalationRecorded {
                escalation,
            } => {
                self.escalations.push(escalation.clone());
            }
            EventPayload::SessionOutcomeRecorded {
                outcome,
            } => {
                self.sessions.push(outcome.clone());
            }
            EventPayload::FallbackUsed {
                ..
            }
            | EventPayload::RollbackTriggered {
                ..
            } => {}
        }
    }

    /// Returns decisions in append order, most recent first.
    #[must_use]
    pub fn decisions_newest_first(&self) -> Vec<&Decision> {
        self.decision_order.iter().rev().filter_map(|id| self.decisions.get(id)).collect()
    }
}

// ============================================================================
// SECTION: Stats
// ============================================================================

/// Rolling success/failure counters for one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TierStat {
    /// Decisions routed to this tier within the stats window.
    pub decisions: u64,
    /// Decisions resolved `success`.
    pub successes: u64,
    /// Decisions resolved `failure` or `unknown_timeout`.
    pub failures: u64,
}

impl TierStat {
    /// Success rate among resolved decisions, or `1.0` if none resolved yet
    /// (an unresolved tier has not yet demonstrated a problem).
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        let resolved = self.successes + self.failures;
        if resolved == 0 {
            1.0
        } else {
            self.successes as f64 / resolved as f64
        }
    }
}

/// Summary statistics over a decision window (`spec.md` §6's `stats` command).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    /// Number of decisions the stats were computed over.
    pub total_decisions: u64,
    /// Per-tier counters.
    pub fast: TierStat,
    /// Per-tier counters.
    pub medium: TierStat,
    /// Per-tier counters.
    pub strong: TierStat,
    /// Mean DQ total across the window.
    pub avg_dq: f64,
    /// Fraction of decisions with an attached outcome (`spec.md` §4.6).
    pub feedback_rate: f64,
}

impl Stats {
    /// Returns the counters for one tier.
    #[must_use]
    pub const fn for_tier(&self, tier: Tier) -> TierStat {
        match tier {
            Tier::Fast => self.fast,
            Tier::Medium => self.medium,
            Tier::Strong => self.strong,
        }
    }
}

/// Computes [`Stats`] over the most recent `window` decisions (or all of
/// them, if `window` is `None`), given decisions newest-first.
#[must_use]
pub fn compute_stats(decisions_newest_first: &[&Decision], window: Option<usize>) -> Stats {
    let slice = match window {
        Some(limit) => &decisions_newest_first[..decisions_newest_first.len().min(limit)],
        None => decisions_newest_first,
    };

    let mut stats = Stats::default();
    if slice.is_empty() {
        return stats;
    }

    let mut dq_sum = 0.0;
    let mut with_feedback = 0_u64;
    for decision in slice {
        dq_sum += decision.dq.total;
        let bucket = match decision.chosen_tier {
            Tier::Fast => &mut stats.fast,
            Tier::Medium => &mut stats.medium,
            Tier::Strong => &mut stats.strong,
        };
        bucket.decisions += 1;
        match decision.outcome {
            Some(Outcome::Success) => bucket.successes += 1,
            Some(Outcome::Failure | Outcome::UnknownTimeout) => bucket.failures += 1,
            None => {}
        }
        if decision.outcome.is_some() {
            with_feedback += 1;
        }
    }

    stats.total_decisions = slice.len() as u64;
    stats.avg_dq = dq_sum / slice.len() as f64;
    stats.feedback_rate = with_feedback as f64 / slice.len() as f64;
    stats
}

#[cfg(test)]
mod tests {
    use kernel_core::Alternative;
    use kernel_core::Decision;
    use kernel_core::DecisionId;
    use kernel_core::DqBreakdown;
    use kernel_core::Outcome;
    use kernel_core::QueryHash;
    use kernel_core::Tier;
    use kernel_core::Timestamp;

    use super::Aggregates;
    use super::compute_stats;
    use crate::event::EventEnvelope;
    use crate::event::EventPayload;

    fn decision(sequence: u64, tier: Tier, outcome: Option<Outcome>) -> Decision {
        Decision {
            id: DecisionId::new(),
            ts: Timestamp::new(sequence, 0),
            query_hash: QueryHash::of("q"),
            query_preview: "q".to_string(),
            complexity: 0.5,
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

    #[test]
    fn rebuild_matches_incremental_apply() {
        let decision_a = decision(1, Tier::Fast, None);
        let decision_b = decision(2, Tier::Strong, Some(Outcome::Success));

        let events = vec![
            EventEnvelope::new(
                1,
                0,
                "1.0.0".to_string(),
                EventPayload::DecisionRecorded {
                    decision: Box::new(decision_a.clone()),
                },
            ),
            EventEnvelope::new(
                2,
                0,
                "1.0.0".to_string(),
                EventPayload::DecisionRecorded {
                    decision: Box::new(decision_b),
                },
            ),
            EventEnvelope::new(
                3,
                0,
                "1.0.0".to_string(),
                EventPayload::OutcomeAttached {
                    decision_id: decision_a.id,
                    outcome: Outcome::Failure,
                    feedback_ts: 5,
                    match_confidence: 1.0,
                },
            ),
        ];

        let mut incremental = Aggregates::default();
        for event in &events {
            incremental.apply(event);
        }
        let rebuilt = Aggregates::rebuild(&events);
        assert_eq!(incremental, rebuilt);
        assert_eq!(rebuilt.decisions.get(&decision_a.id).and_then(|d| d.outcome), Some(Outcome::Failure));
    }

    #[test]
    fn fallback_and_rollback_events_leave_aggregates_unchanged() {
        use kernel_core::DecisionId;

        let mut aggregates = Aggregates::default();
        let before = aggregates.clone();
        aggregates.apply(&EventEnvelope::new(1, 0, "1.0.0".to_string(), EventPayload::FallbackUsed {
            decision_id: DecisionId::new(),
            tier: Tier::Fast,
        }));
        aggregates.apply(&EventEnvelope::new(2, 0, "1.0.1".to_string(), EventPayload::RollbackTriggered {
            proposal_id: "p-1".to_string(),
            reverted_to_version: "1.0.0".to_string(),
        }));
        assert_eq!(aggregates.decisions, before.decisions);
        assert_eq!(aggregates.sessions, before.sessions);
        assert_eq!(aggregates.max_sequence, 2);
    }

    #[test]
    fn stats_computes_avg_dq_and_feedback_rate() {
        let decisions = vec![decision(1, Tier::Fast, Some(Outcome::Success)), decision(2, Tier::Fast, None)];
        let refs: Vec<&Decision> = decisions.iter().collect();
        let stats = compute_stats(&refs, None);
        assert_eq!(stats.total_decisions, 2);
        assert!((stats.avg_dq - 0.8).abs() < 1e-9);
        assert_eq!(stats.feedback_rate, 0.5);
        assert_eq!(stats.fast.successes, 1);
    }

    #[test]
    fn empty_window_yields_zeroed_stats() {
        let stats = compute_stats(&[], None);
        assert_eq!(stats.total_decisions, 0);
        assert_eq!(stats.avg_dq, 0.0);
    }
}
