// kernel-baselines/src/lib.rs
// ============================================================================
// Module: Kernel Baselines Store
// Description: Typed, versioned, durable configuration store.
// Purpose: Expose BaselineStore (spec.md §4.1) as the sole owner of the
// Baselines singleton at runtime.
// Dependencies: kernel-core, tempfile, serde_json
// ============================================================================

//! ## Overview
//! This crate is the only place `Baselines` is mutated. Reads are cheap
//! (clone of an in-memory snapshot or a single file read); writes take an
//! exclusive lock, validate invariants, bump the version, append a lineage
//! entry, and persist atomically via write-to-temp-then-rename.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod patch;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use patch::PatchError;
pub use patch::apply_patch;
pub use store::ApplyOutcome;
pub use store::BaselineStore;
pub use store::StoreError;
