// kernel-core/src/model/time.rs
// ============================================================================
// Module: Kernel Time Model
// Description: Canonical timestamp representation for decisions and events.
// Purpose: Pair a monotonic sequence number with a wall-clock reading so
// ordering is deterministic even when wall clocks are adjusted.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every durable record carries a [`Timestamp`] rather than a bare
//! `SystemTime`. The monotonic `sequence` field is what `spec.md` §5 calls
//! the "durable-append timestamp" used to order concurrent decisions; the
//! `wall_unix_ms` field is what outcome signals compare against when
//! resolving late feedback (`spec.md` §5's ordering guarantee).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// A monotonic-plus-wall-clock timestamp.
///
/// # Invariants
/// - `sequence` is assigned by the component that durably appends the
///   record (TelemetryStore, BaselineStore); it strictly increases within a
///   single store.
/// - `wall_unix_ms` is supplied by the caller and is never read back by core
///   algorithms for ordering decisions — only for display and for resolving
///   late feedback signals against `spec.md` §5's ordering guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    /// Monotonic append sequence, strictly increasing per store.
    pub sequence: u64,
    /// Wall-clock reading in Unix milliseconds.
    pub wall_unix_ms: i64,
}

impl Timestamp {
    /// Constructs a timestamp from its components.
    #[must_use]
    pub const fn new(sequence: u64, wall_unix_ms: i64) -> Self {
        Self {
            sequence,
            wall_unix_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn timestamps_order_by_sequence_first() {
        let earlier = Timestamp::new(1, 1_000);
        let later = Timestamp::new(2, 500);
        assert!(earlier < later);
    }
}
