// kernel-telemetry/src/store.rs
// ============================================================================
// Module: Telemetry Store
// Description: Append-only event log plus indexed in-memory aggregates.
// Purpose: Implement TelemetryStore (spec.md §4.2): Append, QueryDecisions,
// QuerySessions, AttachOutcome, Stats.
// Dependencies: kernel-core, kernel-telemetry::{event, log, aggregates}
// ============================================================================

//! ## Overview
//! Writes are serialised through a single `Mutex<State>` guarding both the
//! in-memory `Aggregates` and the append sequence counter — a single-writer
//! queue in miniature (`spec.md` §5). Readers clone out of the guard rather
//! than holding it, so queries never block a concurrent append for longer
//! than a `Vec` copy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use kernel_core::Decision;
use kernel_core::DecisionId;
use kernel_core::EscalationEvent;
use kernel_core::Outcome;
use kernel_core::SessionOutcome;
use kernel_core::SignalTarget;
use kernel_core::Tier;
use thiserror::Error;

use crate::aggregates::Aggregates;
use crate::aggregates::Stats;
use crate::aggregates::compute_stats;
use crate::event::EventEnvelope;
use crate::event::EventPayload;
use crate::log::EventLog;
use crate::log::LogError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure modes for [`TelemetryStore`] operations (`spec.md` §4.2, §7).
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The append-only log could not be read or written.
    #[error("event log error: {0}")]
    Log(#[from] LogError),
    /// No open (non-terminal) decision's preview matched the prefix.
    #[error("no matching open decision for prefix {0:?}")]
    NoMatchingDecision(String),
    /// The store's internal lock was poisoned by a prior panic.
    #[error("telemetry store lock poisoned")]
    LockPoisoned,
}

// ============================================================================
// SECTION: Filters
// ============================================================================

/// Filter for [`TelemetryStore::query_decisions`].
#[derive(Debug, Clone, Default)]
pub struct DecisionFilter {
    /// Restrict to decisions chosen for this tier.
    pub tier: Option<Tier>,
    /// Restrict to decisions with (or without) a terminal outcome.
    pub terminal_only: bool,
    /// Cap the number of (newest-first) results returned.
    pub limit: Option<usize>,
}

// ============================================================================
// SECTION: Attach Result
// ============================================================================

/// Result of resolving and attaching an outcome signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachedOutcome {
    /// The decision the outcome was (or had already been) attached to.
    pub decision_id: DecisionId,
    /// The outcome now recorded against that decision.
    pub outcome: Outcome,
    /// Confidence of the resolution: `1.0` for a direct id or an
    /// unambiguous prefix match, `< 1.0` for an ambiguous prefix match.
    pub match_confidence: f64,
    /// Whether the decision was already terminal (idempotent no-op).
    pub already_terminal: bool,
}

// ============================================================================
// SECTION: Telemetry Store
// ============================================================================

struct State {
    aggregates: Aggregates,
    sequence: u64,
}

/// Durable, append-only telemetry store with indexed in-memory aggregates.
pub struct TelemetryStore {
    log: EventLog,
    state: Mutex<State>,
}

impl TelemetryStore {
    /// Opens a store rooted at `root`, rebuilding its in-memory aggregates
    /// from whatever events are already on disk.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the existing log cannot be read.
    pub fn open(root: impl Into<std::path::PathBuf>) -> Result<Self, LogError> {
        let log = EventLog::new(root);
        let events = log.read_all()?;
        let aggregates = Aggregates::rebuild(&events);
        let sequence = aggregates.max_sequence;
        Ok(Self {
            log,
            state: Mutex::new(State {
                aggregates,
                sequence,
            }),
        })
    }

    /// Appends a newly routed [`Decision`], durably, before returning
    /// (`spec.md` §4.2(a)).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Log`] when persistence fails, or
    /// [`TelemetryError::LockPoisoned`] if a prior panic poisoned the store.
    pub fn append_decision(&self, decision: Decision) -> Result<(), TelemetryError> {
        let Ok(mut state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };
        let sequence = next_sequence(&mut state);
        let envelope = EventEnvelope::new(
            sequence,
            decision.ts.wall_unix_ms,
            decision.baseline_version.clone(),
            EventPayload::DecisionRecorded {
                decision: Box::new(decision),
            },
        );
        self.log.append(&envelope)?;
        state.aggregates.apply(&envelope);
        Ok(())
    }

    /// Resolves `target` to a decision (directly, or via best-effort prefix
    /// match against `query_preview` among still-open decisions) and
    /// attaches `outcome`. Idempotent per decision id: a decision that is
    /// already terminal is left untouched and the prior outcome is
    /// returned (`spec.md` §4.2(b)).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::NoMatchingDecision`] when no open decision
    /// matches, or [`TelemetryError::Log`] when persistence fails.
    pub fn attach_outcome(&self, target: &SignalTarget, outcome: Outcome, wall_unix_ms: i64, baseline_version: &str) -> Result<AttachedOutcome, TelemetryError> {
        let Ok(mut state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };

        let (decision_id, match_confidence) = resolve_target(&state.aggregates, target)?;

        if let Some(existing) = state.aggregates.decisions.get(&decision_id).and_then(|d| d.outcome) {
            return Ok(AttachedOutcome {
                decision_id,
                outcome: existing,
                match_confidence,
                already_terminal: true,
            });
        }

        let sequence = next_sequence(&mut state);
        let envelope = EventEnvelope::new(
            sequence,
            wall_unix_ms,
            baseline_version.to_string(),
            EventPayload::OutcomeAttached {
                decision_id,
                outcome,
                feedback_ts: wall_unix_ms,
                match_confidence,
            },
        );
        self.log.append(&envelope)?;
        state.aggregates.apply(&envelope);

        Ok(AttachedOutcome {
            decision_id,
            outcome,
            match_confidence,
            already_terminal: false,
        })
    }

    /// Records an [`EscalationEvent`] linking a failed decision to its
    /// retry at a higher tier (`spec.md` §4.6, §9).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Log`] when persistence fails.
    pub fn record_escalation(&self, escalation: EscalationEvent, baseline_version: &str) -> Result<(), TelemetryError> {
        let Ok(mut state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };
        let sequence = next_sequence(&mut state);
        let envelope = EventEnvelope::new(sequence, escalation.ts.wall_unix_ms, baseline_version.to_string(), EventPayload::EscalationRecorded {
            escalation,
        });
        self.log.append(&envelope)?;
        state.aggregates.apply(&envelope);
        Ok(())
    }

    /// Records a computed [`SessionOutcome`] (`spec.md` §3).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Log`] when persistence fails.
    pub fn record_session_outcome(&self, outcome: SessionOutcome, wall_unix_ms: i64, baseline_version: &str) -> Result<(), TelemetryError> {
        let Ok(mut state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };
        let sequence = next_sequence(&mut state);
        let envelope = EventEnvelope::new(sequence, wall_unix_ms, baseline_version.to_string(), EventPayload::SessionOutcomeRecorded {
            outcome,
        });
        self.log.append(&envelope)?;
        state.aggregates.apply(&envelope);
        Ok(())
    }

    /// Records that the router's scoring ceiling was exceeded and the
    /// rule-based fallback selected `tier` for `decision_id` (`spec.md` §5).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Log`] when persistence fails, or
    /// [`TelemetryError::LockPoisoned`] if a prior panic poisoned the store.
    pub fn record_fallback_used(&self, decision_id: DecisionId, tier: Tier, wall_unix_ms: i64, baseline_version: &str) -> Result<(), TelemetryError> {
        let Ok(mut state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };
        let sequence = next_sequence(&mut state);
        let envelope = EventEnvelope::new(sequence, wall_unix_ms, baseline_version.to_string(), EventPayload::FallbackUsed {
            decision_id,
            tier,
        });
        self.log.append(&envelope)?;
        state.aggregates.apply(&envelope);
        Ok(())
    }

    /// Records that the post-apply regression monitor auto-reverted
    /// `proposal_id` (`spec.md` §4.8, §8 scenario 6).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Log`] when persistence fails, or
    /// [`TelemetryError::LockPoisoned`] if a prior panic poisoned the store.
    pub fn record_rollback_triggered(&self, proposal_id: String, reverted_to_version: String, wall_unix_ms: i64, baseline_version: &str) -> Result<(), TelemetryError> {
        let Ok(mut state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };
        let sequence = next_sequence(&mut state);
        let envelope = EventEnvelope::new(sequence, wall_unix_ms, baseline_version.to_string(), EventPayload::RollbackTriggered {
            proposal_id,
            reverted_to_version,
        });
        self.log.append(&envelope)?;
        state.aggregates.apply(&envelope);
        Ok(())
    }

    /// Returns decisions matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::LockPoisoned`] if a prior panic poisoned
    /// the store.
    pub fn query_decisions(&self, filter: &DecisionFilter) -> Result<Vec<Decision>, TelemetryError> {
        let Ok(state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };
        let mut results: Vec<Decision> = state
            .aggregates
            .decisions_newest_first()
            .into_iter()
            .filter(|decision| filter.tier.is_none_or(|tier| decision.chosen_tier == tier))
            .filter(|decision| !filter.terminal_only || decision.outcome.is_some())
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    /// Returns every recorded session outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::LockPoisoned`] if a prior panic poisoned
    /// the store.
    pub fn query_sessions(&self) -> Result<Vec<SessionOutcome>, TelemetryError> {
        let Ok(state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };
        Ok(state.aggregates.sessions.clone())
    }

    /// Computes [`Stats`] over the most recent `window` decisions.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::LockPoisoned`] if a prior panic poisoned
    /// the store.
    pub fn stats(&self, window: Option<usize>) -> Result<Stats, TelemetryError> {
        let Ok(state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };
        let newest_first = state.aggregates.decisions_newest_first();
        Ok(compute_stats(&newest_first, window))
    }

    /// Rereads the entire event log from disk and rebuilds aggregates,
    /// independent of the live in-memory copy. `spec.md` §8 invariant 6
    /// requires this to equal the live aggregates at any quiescent point.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the log cannot be read.
    pub fn rebuild_from_events(&self) -> Result<Aggregates, LogError> {
        let events = self.log.read_all()?;
        Ok(Aggregates::rebuild(&events))
    }

    /// Returns a clone of the live aggregates, for comparison against
    /// [`Self::rebuild_from_events`] in tests.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::LockPoisoned`] if a prior panic poisoned
    /// the store.
    pub fn live_aggregates(&self) -> Result<Aggregates, TelemetryError> {
        let Ok(state) = self.state.lock() else {
            return Err(TelemetryError::LockPoisoned);
        };
        Ok(state.aggregates.clone())
    }
}

fn next_sequence(state: &mut State) -> u64 {
    state.sequence += 1;
    state.sequence
}

/// Resolves an outcome signal's target to a concrete decision id
/// (`spec.md` §4.2's best-effort prefix match).
fn resolve_target(aggregates: &Aggregates, target: &SignalTarget) -> Result<(DecisionId, f64), TelemetryError> {
    match target {
        SignalTarget::DecisionId(id) => Ok((*id, 1.0)),
        SignalTarget::QueryPrefix(prefix) => {
            let candidates: Vec<&Decision> = aggregates.decisions_newest_first().into_iter().filter(|d| d.outcome.is_none() && d.query_preview.starts_with(prefix.as_str())).collect();
            match candidates.len() {
                0 => Err(TelemetryError::NoMatchingDecision(prefix.clone())),
                1 => Ok((candidates[0].id, 1.0)),
                count => Ok((candidates[0].id, 1.0 / count as f64)),
            }
        }
    }
}
