// kernel-core/src/model/hashing.rs
// ============================================================================
// Module: Kernel Canonical Hashing
// Description: RFC 8785 JSON canonicalization and query hashing utilities.
// Purpose: Provide deterministic hashes for baselines (lineage/round-trip
// verification) and queries (the stable 128-bit query_hash in spec.md §3).
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Baselines are hashed over their canonical JSON form (RFC 8785 / JCS) so
//! the round-trip law in `spec.md` §8 ("Load; Apply; Rollback; Load yields
//! byte-equal Baselines") can be checked without a byte-for-byte file diff.
//! Queries are hashed directly over their UTF-8 bytes to produce the stable
//! `query_hash` carried on every [`Decision`](crate::model::decision::Decision).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// A SHA-256 digest rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest(String);

impl HashDigest {
    /// Hashes raw bytes.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex_encode(&hasher.finalize()))
    }

    /// Returns the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HashDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

/// Hashes a serializable value's canonical JSON form.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<HashDigest, HashError> {
    let bytes = serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))?;
    Ok(HashDigest::of_bytes(&bytes))
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

// ============================================================================
// SECTION: Query Hash
// ============================================================================

/// Stable 128-bit hash of a query's raw text (`spec.md` §3's `query_hash`).
///
/// Truncated from a SHA-256 digest; 128 bits is ample to avoid collisions
/// among the query volumes this kernel expects while keeping the identifier
/// compact in telemetry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryHash([u8; 16]);

impl QueryHash {
    /// Computes the query hash for a raw query string.
    #[must_use]
    pub fn of(query: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(query.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0_u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(bytes)
    }

    /// Renders the hash as a lowercase hex string.
    #[must_use]
    pub fn to_hex(self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut out = String::with_capacity(32);
        for byte in self.0 {
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
        }
        out
    }
}

impl std::fmt::Display for QueryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Truncates a query to at most 50 characters for the `query_preview` field
/// (`spec.md` §3), cutting on a char boundary.
#[must_use]
pub fn query_preview(query: &str) -> String {
    const MAX_LEN: usize = 50;
    if query.chars().count() <= MAX_LEN {
        return query.to_string();
    }
    query.chars().take(MAX_LEN).collect()
}
