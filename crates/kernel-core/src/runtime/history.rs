// kernel-core/src/runtime/history.rs
// ============================================================================
// Module: Kernel History Snapshot
// Description: Read-only view of past decisions used by scoring algorithms.
// Purpose: Define HistoricalQuery and the Jaccard similarity helper shared by
// ComplexityAnalyzer (historical pull) and DQScorer (correctness).
// Dependencies: crate::model::{signal, tier}
// ============================================================================

//! ## Overview
//! `spec.md` §4.3/§4.4 both lean on "semantically similar past queries,
//! Jaccard over token sets, threshold 0.3". This module is the one place
//! that similarity is computed, so both callers agree on its definition.
//! History is always passed as a borrowed slice — a snapshot taken once by
//! the caller (`spec.md` §5: "neither is mutated during scoring").

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::model::signal::Outcome;
use crate::model::tier::Tier;

/// Jaccard similarity threshold above which two queries are considered
/// "semantically similar" (`spec.md` §4.3, §4.4).
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

// ============================================================================
// SECTION: Historical Query
// ============================================================================

/// One past decision, reduced to the fields the scoring algorithms need.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalQuery {
    /// The original query text (kept in memory only for this snapshot; not
    /// re-persisted here).
    pub query: String,
    /// The complexity score recorded for that decision.
    pub complexity: f64,
    /// The tier chosen for that decision.
    pub tier: Tier,
    /// The DQ total recorded for that decision.
    pub dq_total: f64,
    /// The outcome attached to that decision, if resolved.
    pub outcome: Option<Outcome>,
}

// ============================================================================
// SECTION: Tokenization & Similarity
// ============================================================================

/// Lower-cases and splits on non-alphanumeric boundaries into a token set.
#[must_use]
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity between two token sets: `|A ∩ B| / |A ∪ B|`.
#[must_use]
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Returns every historical query similar to `query` (Jaccard >= [`SIMILARITY_THRESHOLD`]),
/// paired with its similarity score.
#[must_use]
pub fn similar<'h>(query: &str, history: &'h [HistoricalQuery]) -> Vec<(&'h HistoricalQuery, f64)> {
    let query_tokens = tokenize(query);
    history
        .iter()
        .filter_map(|entry| {
            let similarity = jaccard(&query_tokens, &tokenize(&entry.query));
            (similarity >= SIMILARITY_THRESHOLD).then_some((entry, similarity))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::HistoricalQuery;
    use super::jaccard;
    use super::similar;
    use super::tokenize;
    use crate::model::tier::Tier;

    #[test]
    fn identical_queries_are_fully_similar() {
        let a = tokenize("design a distributed cache");
        let b = tokenize("design a distributed cache");
        assert!((jaccard(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_queries_have_zero_similarity() {
        let a = tokenize("hello world");
        let b = tokenize("fix the bug");
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn similar_filters_below_threshold() {
        let history = vec![HistoricalQuery {
            query: "fix the bug in the parser".to_string(),
            complexity: 0.5,
            tier: Tier::Medium,
            dq_total: 0.8,
            outcome: None,
        }];
        assert!(similar("completely unrelated text here", &history).is_empty());
        assert!(!similar("fix the bug in the parser please", &history).is_empty());
    }
}
