// kernel-core/src/model/baselines.rs
// ============================================================================
// Module: Kernel Baselines
// Description: Typed, versioned routing configuration.
// Purpose: Define the Baselines singleton (weights, thresholds, cost table,
// feedback gates, lineage) and its invariant checks.
// Dependencies: crate::model::tier, serde, thiserror
// ============================================================================

//! ## Overview
//! `Baselines` is the kernel's only mutable configuration surface
//! (`spec.md` §3). This module defines the type and its structural
//! invariants; persistence, locking, and lineage *appending* live in the
//! `kernel-baselines` crate, which is the exclusive owner of this type at
//! runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::model::tier::Tier;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tolerance for the "weights sum to 1" invariant (`spec.md` §3/§8).
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;
/// Renormalization tolerance: weights within 1% of summing to 1 are rescaled
/// rather than rejected (`spec.md` §4.1).
pub const WEIGHT_RENORMALIZE_TOLERANCE: f64 = 0.01;

// ============================================================================
// SECTION: Baselines
// ============================================================================

/// The kernel's versioned configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    /// Monotonically increasing dotted version string, e.g. `"1.4.2"`.
    pub version: String,
    /// Weights applied to the DQ components; sum to 1 within [`WEIGHT_SUM_EPSILON`].
    pub dq_weights: DqWeights,
    /// Complexity ranges partitioning `[0, 1)` across tiers.
    pub complexity_thresholds: ComplexityThresholds,
    /// Normalised per-tier cost table.
    pub cost_per_mtok: CostTable,
    /// Minimum DQ to treat a routing decision as "confident".
    pub actionable_threshold: f64,
    /// Thresholds gating automatic baseline updates.
    pub feedback_gates: FeedbackGates,
    /// Ordered, append-only history of applied changes.
    pub lineage: Vec<LineageEntry>,
}

impl Baselines {
    /// Returns hard-coded defaults used when no persisted baseline can be
    /// loaded (`spec.md` §4.1's `LOADFAIL` fallback).
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            version: "1.0.0".to_string(),
            dq_weights: DqWeights {
                validity: 0.4,
                specificity: 0.3,
                correctness: 0.3,
            },
            complexity_thresholds: ComplexityThresholds::new(0.25, 0.70),
            cost_per_mtok: CostTable {
                fast: CostPerMtok {
                    input: 0.25,
                    output: 1.25,
                },
                medium: CostPerMtok {
                    input: 1.0,
                    output: 5.0,
                },
                strong: CostPerMtok {
                    input: 5.0,
                    output: 25.0,
                },
            },
            actionable_threshold: 0.7,
            feedback_gates: FeedbackGates::defaults(),
            lineage: Vec::new(),
        }
    }

    /// Returns the ideal tier for a complexity score, per
    /// `complexity_thresholds` (used by the DQ scorer's specificity term).
    #[must_use]
    pub fn ideal_tier(&self, complexity: f64) -> Tier {
        self.complexity_thresholds.tier_for(complexity)
    }

    /// Returns the per-input/output-token cost for a tier.
    #[must_use]
    pub fn cost_for(&self, tier: Tier) -> CostPerMtok {
        self.cost_per_mtok.for_tier(tier)
    }

    /// Validates every structural invariant in `spec.md` §3/§8.
    ///
    /// # Errors
    ///
    /// Returns [`BaselinesError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), BaselinesError> {
        self.dq_weights.validate()?;
        self.complexity_thresholds.validate()?;
        self.cost_per_mtok.validate()?;
        if !(0.0..=1.0).contains(&self.actionable_threshold) {
            return Err(BaselinesError::ActionableThresholdOutOfRange(self.actionable_threshold));
        }
        self.feedback_gates.validate()?;
        validate_lineage(&self.lineage)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: DQ Weights
// ============================================================================

/// Weights applied to the three DQ components (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DqWeights {
    /// Weight applied to the validity component.
    pub validity: f64,
    /// Weight applied to the specificity component.
    pub specificity: f64,
    /// Weight applied to the correctness component.
    pub correctness: f64,
}

impl DqWeights {
    /// Returns the sum of all three weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.validity + self.specificity + self.correctness
    }

    /// Rescales the weights so they sum to exactly 1.0, preserving ratios.
    #[must_use]
    pub fn renormalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 {
            return *self;
        }
        Self {
            validity: self.validity / sum,
            specificity: self.specificity / sum,
            correctness: self.correctness / sum,
        }
    }

    /// Validates each weight is in `[0, 1]` and the sum is within epsilon of 1.
    ///
    /// # Errors
    ///
    /// Returns [`BaselinesError::WeightsNotNormalised`] or
    /// [`BaselinesError::WeightOutOfRange`].
    pub fn validate(&self) -> Result<(), BaselinesError> {
        for (name, value) in [
            ("validity", self.validity),
            ("specificity", self.specificity),
            ("correctness", self.correctness),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BaselinesError::WeightOutOfRange(name, value));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(BaselinesError::WeightsNotNormalised(sum));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Complexity Thresholds
// ============================================================================

/// Half-open complexity ranges that partition `[0, 1]` across the three
/// tiers (`spec.md` §3: "exactly one tier per point; ranges disjoint and
/// covering").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityThresholds {
    /// Upper bound (exclusive) of the fast tier's range; fast owns `[0, fast_hi)`.
    pub fast_hi: f64,
    /// Upper bound (exclusive) of the medium tier's range; medium owns `[fast_hi, medium_hi)`.
    pub medium_hi: f64,
}

impl ComplexityThresholds {
    /// Constructs thresholds from the fast/medium boundary points. Strong
    /// owns `[medium_hi, 1.0]` (closed at the top, since complexity is
    /// clamped to `[0, 1]`).
    #[must_use]
    pub const fn new(fast_hi: f64, medium_hi: f64) -> Self {
        Self {
            fast_hi,
            medium_hi,
        }
    }

    /// Returns the tier that owns `complexity`, per half-open interval rules
    /// (`spec.md` §8: "the lower tier owns the boundary").
    #[must_use]
    pub fn tier_for(&self, complexity: f64) -> Tier {
        if complexity < self.fast_hi {
            Tier::Fast
        } else if complexity < self.medium_hi {
            Tier::Medium
        } else {
            Tier::Strong
        }
    }

    /// Returns the half-open `[lo, hi)` range owned by `tier` (strong's upper
    /// bound is reported as `1.0` though its interval is closed there).
    #[must_use]
    pub const fn range_for(&self, tier: Tier) -> (f64, f64) {
        match tier {
            Tier::Fast => (0.0, self.fast_hi),
            Tier::Medium => (self.fast_hi, self.medium_hi),
            Tier::Strong => (self.medium_hi, 1.0),
        }
    }

    /// Validates the partition property: both boundaries lie strictly inside
    /// `(0, 1)` and are strictly increasing, so every tier owns a non-empty
    /// range and the union covers `[0, 1]` exactly once per point.
    ///
    /// # Errors
    ///
    /// Returns [`BaselinesError::ThresholdsNotPartition`] when the boundaries
    /// are out of order or out of range.
    pub fn validate(&self) -> Result<(), BaselinesError> {
        if !(0.0..1.0).contains(&self.fast_hi)
            || !(0.0..1.0).contains(&self.medium_hi)
            || self.fast_hi >= self.medium_hi
        {
            return Err(BaselinesError::ThresholdsNotPartition {
                fast_hi: self.fast_hi,
                medium_hi: self.medium_hi,
            });
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Cost Table
// ============================================================================

/// Normalised per-million-token cost for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostPerMtok {
    /// Cost per million input tokens.
    pub input: f64,
    /// Cost per million output tokens.
    pub output: f64,
}

impl CostPerMtok {
    fn validate(&self, tier: Tier) -> Result<(), BaselinesError> {
        for (label, value) in [("input", self.input), ("output", self.output)] {
            if !value.is_finite() || value < 0.0 {
                return Err(BaselinesError::CostInvalid {
                    tier,
                    field: label,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Cost table indexed by tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostTable {
    /// Fast-tier cost.
    pub fast: CostPerMtok,
    /// Medium-tier cost.
    pub medium: CostPerMtok,
    /// Strong-tier cost.
    pub strong: CostPerMtok,
}

impl CostTable {
    /// Returns the cost entry for a tier.
    #[must_use]
    pub const fn for_tier(&self, tier: Tier) -> CostPerMtok {
        match tier {
            Tier::Fast => self.fast,
            Tier::Medium => self.medium,
            Tier::Strong => self.strong,
        }
    }

    fn validate(&self) -> Result<(), BaselinesError> {
        self.fast.validate(Tier::Fast)?;
        self.medium.validate(Tier::Medium)?;
        self.strong.validate(Tier::Strong)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Feedback Gates
// ============================================================================

/// Thresholds gating auto-update proposals (`spec.md` §3/§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackGates {
    /// Minimum total decisions before any auto-update may apply.
    pub min_queries: u64,
    /// Minimum attached feedback signals before any auto-update may apply.
    pub min_feedback: u64,
    /// Minimum data-quality score (`spec.md` §4.8) required to apply.
    pub min_data_quality: f64,
    /// Size of the "most-recent" sample checked for performance targets.
    pub recent_sample: u64,
    /// Efficiency drop (relative) that triggers an automatic rollback.
    pub rollback_drop_pct: f64,
    /// Maximum number of applied updates within one update window.
    pub max_updates_per_window: u32,
    /// Width, in queries, of one update window.
    pub update_window_queries: u64,
}

impl FeedbackGates {
    /// Returns conservative defaults.
    #[must_use]
    pub const fn defaults() -> Self {
        Self {
            min_queries: 200,
            min_feedback: 30,
            min_data_quality: 0.6,
            recent_sample: 40,
            rollback_drop_pct: 0.15,
            max_updates_per_window: 3,
            update_window_queries: 500,
        }
    }

    fn validate(&self) -> Result<(), BaselinesError> {
        if !(0.0..=1.0).contains(&self.min_data_quality) {
            return Err(BaselinesError::GateOutOfRange("min_data_quality", self.min_data_quality));
        }
        if !(0.0..=1.0).contains(&self.rollback_drop_pct) {
            return Err(BaselinesError::GateOutOfRange("rollback_drop_pct", self.rollback_drop_pct));
        }
        if self.recent_sample == 0 || self.update_window_queries == 0 {
            return Err(BaselinesError::GateOutOfRange("recent_sample/update_window_queries", 0.0));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Lineage
// ============================================================================

/// One entry in the append-only baseline lineage (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEntry {
    /// Version that became current as of this entry.
    pub version: String,
    /// Wall-clock time the change was applied, in Unix milliseconds.
    pub applied_at_unix_ms: i64,
    /// Identifier of the proposal that produced this change, if any.
    pub proposal_id: Option<String>,
    /// Human-readable rationale for the change.
    pub rationale: String,
    /// Identity of whoever (or whatever) authored the change.
    pub author: String,
}

/// Validates that lineage versions strictly increase (`spec.md` §8 invariant 3).
fn validate_lineage(lineage: &[LineageEntry]) -> Result<(), BaselinesError> {
    let mut previous: Option<&str> = None;
    for entry in lineage {
        if let Some(prev) = previous
            && compare_versions(prev, &entry.version) != std::cmp::Ordering::Less
        {
            return Err(BaselinesError::LineageNotIncreasing {
                previous: prev.to_string(),
                next: entry.version.clone(),
            });
        }
        previous = Some(&entry.version);
    }
    Ok(())
}

/// Compares two dotted-integer version strings (e.g. `"1.4.2"`), padding the
/// shorter with zeros. Non-numeric segments compare as their raw strings.
#[must_use]
pub fn compare_versions(left: &str, right: &str) -> std::cmp::Ordering {
    let left_parts = version_parts(left);
    let right_parts = version_parts(right);
    let len = left_parts.len().max(right_parts.len());
    for idx in 0..len {
        let left_part = left_parts.get(idx).copied().unwrap_or(0);
        let right_part = right_parts.get(idx).copied().unwrap_or(0);
        match left_part.cmp(&right_part) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

fn version_parts(version: &str) -> Vec<u64> {
    version.split('.').map(|part| part.parse::<u64>().unwrap_or(0)).collect()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Structural invariant violations for [`Baselines`] (`spec.md` §4.1, §7).
#[derive(Debug, Error, PartialEq)]
pub enum BaselinesError {
    /// A DQ weight fell outside `[0, 1]`.
    #[error("dq weight {0} out of range: {1}")]
    WeightOutOfRange(&'static str, f64),
    /// The DQ weights do not sum to 1 within tolerance.
    #[error("dq weights sum to {0}, expected 1.0 +/- {WEIGHT_SUM_EPSILON}")]
    WeightsNotNormalised(f64),
    /// The complexity thresholds do not form a valid partition of `[0, 1)`.
    #[error("complexity thresholds do not partition [0, 1): fast_hi={fast_hi}, medium_hi={medium_hi}")]
    ThresholdsNotPartition {
        /// Offending fast/medium boundary.
        fast_hi: f64,
        /// Offending medium/strong boundary.
        medium_hi: f64,
    },
    /// A cost table entry was negative or non-finite.
    #[error("cost for tier {tier} field {field} is invalid: {value}")]
    CostInvalid {
        /// Tier the invalid cost belongs to.
        tier: Tier,
        /// Field name (`"input"` or `"output"`).
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// `actionable_threshold` fell outside `[0, 1]`.
    #[error("actionable_threshold out of range: {0}")]
    ActionableThresholdOutOfRange(f64),
    /// A feedback gate value fell outside its valid range.
    #[error("feedback gate {0} out of range: {1}")]
    GateOutOfRange(&'static str, f64),
    /// Lineage versions are not strictly increasing.
    #[error("lineage version did not increase: {previous} -> {next}")]
    LineageNotIncreasing {
        /// Previous lineage version.
        previous: String,
        /// Offending next version.
        next: String,
    },
    /// The proposed weight renormalisation exceeded the 1% tolerance.
    #[error("weights sum to {0}, outside the {WEIGHT_RENORMALIZE_TOLERANCE} renormalisation tolerance")]
    WeightsNotRenormalisable(f64),
}

#[cfg(test)]
mod tests {
    use super::Baselines;
    use super::BaselinesError;
    use super::ComplexityThresholds;
    use super::DqWeights;
    use super::LineageEntry;
    use super::compare_versions;
    use crate::model::tier::Tier;

    #[test]
    fn defaults_are_valid() {
        Baselines::defaults().validate().expect("defaults must validate");
    }

    #[test]
    fn thresholds_partition_every_point() {
        let thresholds = ComplexityThresholds::new(0.25, 0.70);
        assert_eq!(thresholds.tier_for(0.0), Tier::Fast);
        assert_eq!(thresholds.tier_for(0.2499), Tier::Fast);
        assert_eq!(thresholds.tier_for(0.25), Tier::Medium);
        assert_eq!(thresholds.tier_for(0.6999), Tier::Medium);
        assert_eq!(thresholds.tier_for(0.70), Tier::Strong);
        assert_eq!(thresholds.tier_for(1.0), Tier::Strong);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let weights = DqWeights {
            validity: 0.5,
            specificity: 0.5,
            correctness: 0.5,
        };
        assert_eq!(weights.validate(), Err(BaselinesError::WeightsNotNormalised(1.5)));
    }

    #[test]
    fn renormalizing_preserves_ratio() {
        let weights = DqWeights {
            validity: 0.2,
            specificity: 0.2,
            correctness: 0.2,
        };
        let renormalized = weights.renormalized();
        assert!((renormalized.sum() - 1.0).abs() < 1e-9);
        assert!((renormalized.validity - renormalized.specificity).abs() < 1e-9);
    }

    #[test]
    fn lineage_must_strictly_increase() {
        let mut baselines = Baselines::defaults();
        baselines.lineage.push(LineageEntry {
            version: "1.0.0".to_string(),
            applied_at_unix_ms: 0,
            proposal_id: None,
            rationale: "seed".to_string(),
            author: "system".to_string(),
        });
        baselines.lineage.push(LineageEntry {
            version: "1.0.0".to_string(),
            applied_at_unix_ms: 1,
            proposal_id: None,
            rationale: "duplicate".to_string(),
            author: "system".to_string(),
        });
        assert!(baselines.validate().is_err());
    }

    #[test]
    fn version_comparison_is_numeric_not_lexicographic() {
        assert_eq!(compare_versions("1.9.0", "1.10.0"), std::cmp::Ordering::Less);
    }
}
