// kernel-core/src/lib.rs
// ============================================================================
// Module: Kernel Core Library
// Description: Public API surface for the routing kernel core.
// Purpose: Expose data model types and the pure routing algorithms.
// Dependencies: crate::{model, runtime}
// ============================================================================

//! ## Overview
//! Kernel core provides the routing kernel's data model (baselines, decisions,
//! signals, session outcomes, proposed updates) and the four pure algorithms
//! that operate on it: complexity analysis, decision-quality scoring, tier
//! routing, and anti-pattern detection inputs. Nothing in this crate performs
//! IO; persistence and background scheduling live in sibling crates that
//! depend on these types.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod model;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use model::baselines::Baselines;
pub use model::baselines::BaselinesError;
pub use model::baselines::ComplexityThresholds;
pub use model::baselines::CostPerMtok;
pub use model::baselines::CostTable;
pub use model::baselines::DqWeights;
pub use model::baselines::FeedbackGates;
pub use model::baselines::LineageEntry;
pub use model::decision::Alternative;
pub use model::decision::Decision;
pub use model::decision::DqBreakdown;
pub use model::hashing::HashDigest;
pub use model::hashing::QueryHash;
pub use model::identifiers::DecisionId;
pub use model::identifiers::ProposalId;
pub use model::identifiers::SessionId;
pub use model::proposal::ProposalStatus;
pub use model::proposal::ProposalType;
pub use model::proposal::ProposedUpdate;
pub use model::session::SessionOutcome;
pub use model::session::SessionStatus;
pub use model::signal::EscalationEvent;
pub use model::signal::EscalationReason;
pub use model::signal::Outcome;
pub use model::signal::OutcomeSignal;
pub use model::signal::SignalKind;
pub use model::signal::SignalTarget;
pub use model::tier::Tier;
pub use model::time::Timestamp;
pub use runtime::complexity::ComplexityAnalyzer;
pub use runtime::complexity::ComplexityEstimate;
pub use runtime::dq::DqScore;
pub use runtime::dq::DqScorer;
pub use runtime::history::HistoricalQuery;
pub use runtime::router::RouteRequest;
pub use runtime::router::Router;
pub use runtime::router::RouterError;
