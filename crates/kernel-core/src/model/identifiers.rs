// kernel-core/src/model/identifiers.rs
// ============================================================================
// Module: Kernel Identifiers
// Description: Canonical opaque identifiers for decisions, proposals, and sessions.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Identifiers are opaque wrappers that serialize as strings (decision and
//! session ids) or as time-ordered values (proposal ids). Validation beyond
//! "non-empty" is handled at the boundary that constructs them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: Decision Identifier
// ============================================================================

/// Unique identifier for a routing [`Decision`](crate::model::decision::Decision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(Uuid);

impl DecisionId {
    /// Generates a fresh random decision identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID as a decision identifier.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the identifier's canonical string form.
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for DecisionId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}

// ============================================================================
// SECTION: Session Identifier
// ============================================================================

/// Caller-supplied session identifier grouping decisions into a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new session identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Proposal Identifier
// ============================================================================

/// Time-ordered identifier for a [`ProposedUpdate`](crate::model::proposal::ProposedUpdate).
///
/// Ordering is by the pair `(minted_at_ms, sequence)` so proposals minted in
/// the same millisecond still compare deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId {
    /// Wall-clock milliseconds at mint time.
    minted_at_ms: i64,
    /// Monotonic tie-breaker for proposals minted in the same millisecond.
    sequence: u32,
}

impl ProposalId {
    /// Creates a new proposal identifier from its ordering components.
    #[must_use]
    pub const fn new(minted_at_ms: i64, sequence: u32) -> Self {
        Self {
            minted_at_ms,
            sequence,
        }
    }

    /// Returns the canonical string form (`"<ms>-<sequence>"`).
    #[must_use]
    pub fn as_str(&self) -> String {
        format!("{}-{}", self.minted_at_ms, self.sequence)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.minted_at_ms, self.sequence)
    }
}
