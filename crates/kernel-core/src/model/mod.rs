// kernel-core/src/model/mod.rs
// ============================================================================
// Module: Kernel Data Model
// Description: Canonical routing kernel value types.
// Purpose: Provide stable, serializable types for baselines, decisions, and
// the feedback/proposal pipeline.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The data model types are the canonical source of truth for the kernel's
//! persisted state. They are plain value types; identity is by explicit id
//! field, and ownership is split between `BaselineStore` (Baselines) and
//! `TelemetryStore` (Decision, OutcomeSignal, SessionOutcome) in the sibling
//! crates that persist them.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod baselines;
pub mod decision;
pub mod hashing;
pub mod identifiers;
pub mod proposal;
pub mod session;
pub mod signal;
pub mod tier;
pub mod time;
