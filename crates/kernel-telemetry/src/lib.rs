// kernel-telemetry/src/lib.rs
// ============================================================================
// Module: Kernel Telemetry Library
// Description: Public API surface for the telemetry store and feedback path.
// Purpose: Expose the event envelope, append-only log, aggregates, store,
// and feedback ingest types (spec.md §4.2, §4.6).
// Dependencies: crate::{event, log, aggregates, store, feedback}
// ============================================================================

//! ## Overview
//! Kernel telemetry owns every side effect the routing kernel produces after
//! a decision is made: durable event logging, in-memory aggregation, and
//! resolving caller-submitted outcome signals. Nothing in `kernel-core`
//! depends on this crate; the dependency runs the other way.

pub mod aggregates;
pub mod event;
pub mod feedback;
pub mod log;
pub mod store;

pub use aggregates::Aggregates;
pub use aggregates::Stats;
pub use aggregates::TierStat;
pub use event::EventEnvelope;
pub use event::EventPayload;
pub use event::SCHEMA_VERSION;
pub use feedback::DEFAULT_GRACE_PERIOD_MS;
pub use feedback::FeedbackIngest;
pub use log::EventLog;
pub use log::LogError;
pub use store::AttachedOutcome;
pub use store::DecisionFilter;
pub use store::TelemetryError;
pub use store::TelemetryStore;
