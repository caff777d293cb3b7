// kernel-analysis/src/pattern_detector.rs
// ============================================================================
// Module: Pattern Detector
// Description: Scans recent decisions for four named anti-patterns.
// Purpose: Implement PatternDetector (spec.md §4.7): emit ProposedUpdates
// with sample-size- and effect-size-derived confidence.
// Dependencies: kernel-core
// ============================================================================

//! ## Overview
//! Each named pattern is a pure function over a decision slice plus the
//! active [`Baselines`]; all detection thresholds below (band boundaries,
//! efficiency floors, step sizes) are detector-internal constants rather
//! than `Baselines` fields, for the same reason `ComplexityAnalyzer`'s
//! keyword weights are analyzer-internal: `spec.md` §3 enumerates exactly
//! which fields `Baselines` carries, and these tuning knobs are not among
//! them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use kernel_core::Baselines;
use kernel_core::Decision;
use kernel_core::Outcome;
use kernel_core::ProposalId;
use kernel_core::ProposalStatus;
use kernel_core::ProposalType;
use kernel_core::ProposedUpdate;
use kernel_core::Tier;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum sample size a detected pattern needs before it reaches full
/// confidence weight (`spec.md` §4.7's `min_sample`).
pub const MIN_SAMPLE: u64 = 30;
/// Strong-tier share above which, combined with low complexity in that
/// slice, over-provisioning is suspected.
const STRONG_SHARE_HIGH_WATER: f64 = 0.35;
/// Complexity ceiling defining "low complexity" for the over-provisioning scan.
const LOW_COMPLEXITY_CEILING: f64 = 0.40;
/// Failure rate above which the fast tier is considered to be struggling.
const FAST_FAILURE_RATE_THRESHOLD: f64 = 0.50;
/// Efficiency floor below which a complexity decile is flagged.
const DECILE_EFFICIENCY_FLOOR: f64 = 0.50;
/// Target share for any single tier before overuse is suspected.
const OVERUSE_TARGET_SHARE: f64 = 0.50;
/// Margin above `OVERUSE_TARGET_SHARE` that triggers the overuse pattern.
const OVERUSE_MARGIN: f64 = 0.15;
/// Step size applied when nudging a threshold boundary.
const THRESHOLD_STEP: f64 = 0.02;

// ============================================================================
// SECTION: Pattern Detector
// ============================================================================

/// Scans a decision window for the four named anti-patterns and emits
/// `ProposedUpdate`s (`spec.md` §4.7).
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternDetector;

impl PatternDetector {
    /// Runs all four detectors over `decisions` against `baselines`,
    /// minting proposal ids from `minted_at_ms` with a per-call sequence.
    #[must_use]
    pub fn detect(&self, decisions: &[Decision], baselines: &Baselines, minted_at_ms: i64) -> Vec<ProposedUpdate> {
        let mut sequence = 0u32;
        let mut next_id = || {
            let id = ProposalId::new(minted_at_ms, sequence);
            sequence += 1;
            id
        };

        let mut proposals = Vec::new();
        if let Some(proposal) = detect_over_provisioning(decisions, baselines, &mut next_id) {
            proposals.push(proposal);
        }
        if let Some(proposal) = detect_under_provisioning(decisions, baselines, &mut next_id) {
            proposals.push(proposal);
        }
        proposals.extend(detect_low_efficiency_bands(decisions, baselines, &mut next_id));
        if let Some(proposal) = detect_overuse(decisions, baselines, &mut next_id) {
            proposals.push(proposal);
        }
        proposals
    }
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

fn effect_weight(excess: f64, scale: f64) -> f64 {
    (excess / scale).clamp(0.0, 1.0)
}

fn confidence(sample_size: u64, excess: f64, scale: f64) -> f64 {
    let sample_ratio = (sample_size as f64 / MIN_SAMPLE as f64).min(1.0);
    sample_ratio * effect_weight(excess, scale)
}

fn tier_slice(decisions: &[Decision], tier: Tier) -> Vec<&Decision> {
    decisions.iter().filter(|d| d.chosen_tier == tier).collect()
}

fn failure_rate(slice: &[&Decision]) -> Option<f64> {
    let resolved: Vec<&&Decision> = slice.iter().filter(|d| d.outcome.is_some()).collect();
    if resolved.is_empty() {
        return None;
    }
    let failures = resolved.iter().filter(|d| matches!(d.outcome, Some(Outcome::Failure | Outcome::UnknownTimeout))).count();
    Some(failures as f64 / resolved.len() as f64)
}

fn efficiency(slice: &[&Decision]) -> Option<f64> {
    failure_rate(slice).map(|rate| 1.0 - rate)
}

fn mean_complexity(slice: &[&Decision]) -> f64 {
    if slice.is_empty() {
        return 0.0;
    }
    slice.iter().map(|d| d.complexity).sum::<f64>() / slice.len() as f64
}

// ============================================================================
// SECTION: Over-Provisioning
// ============================================================================

/// Strong-tier share above the high-water mark, combined with low mean
/// complexity in that slice, suggests the strong tier is being reached for
/// requests it did not need (`spec.md` §4.7).
fn detect_over_provisioning(decisions: &[Decision], baselines: &Baselines, next_id: &mut impl FnMut() -> ProposalId) -> Option<ProposedUpdate> {
    if decisions.is_empty() {
        return None;
    }
    let strong = tier_slice(decisions, Tier::Strong);
    let share = strong.len() as f64 / decisions.len() as f64;
    if share <= STRONG_SHARE_HIGH_WATER {
        return None;
    }
    let mean = mean_complexity(&strong);
    if mean >= LOW_COMPLEXITY_CEILING {
        return None;
    }

    let sample_size = strong.len() as u64;
    if sample_size < MIN_SAMPLE {
        return None;
    }
    let excess = share - STRONG_SHARE_HIGH_WATER;
    let proposed = (baselines.complexity_thresholds.medium_hi + THRESHOLD_STEP).min(0.99);

    Some(ProposedUpdate {
        id: next_id(),
        kind: ProposalType::ThresholdAdjustment,
        target_path: "complexity_thresholds.medium_hi".to_string(),
        current_value: json!(baselines.complexity_thresholds.medium_hi),
        proposed_value: json!(proposed),
        rationale: format!("strong tier share {share:.2} exceeds high-water mark {STRONG_SHARE_HIGH_WATER:.2} at mean complexity {mean:.2}; raising the strong-tier lower bound"),
        sample_size,
        confidence: confidence(sample_size, excess, STRONG_SHARE_HIGH_WATER),
        status: ProposalStatus::Proposed,
        parent_baseline_version: baselines.version.clone(),
    })
}

// ============================================================================
// SECTION: Under-Provisioning / Fast-Tier Struggle
// ============================================================================

/// Fast-tier failure rate above threshold suggests the fast-tier upper
/// bound is admitting requests it cannot serve (`spec.md` §4.7).
fn detect_under_provisioning(decisions: &[Decision], baselines: &Baselines, next_id: &mut impl FnMut() -> ProposalId) -> Option<ProposedUpdate> {
    let fast = tier_slice(decisions, Tier::Fast);
    let resolved_count = fast.iter().filter(|d| d.outcome.is_some()).count() as u64;
    if resolved_count < MIN_SAMPLE {
        return None;
    }
    let rate = failure_rate(&fast)?;
    if rate <= FAST_FAILURE_RATE_THRESHOLD {
        return None;
    }

    let excess = rate - FAST_FAILURE_RATE_THRESHOLD;
    let proposed = (baselines.complexity_thresholds.fast_hi - THRESHOLD_STEP).max(0.01);

    Some(ProposedUpdate {
        id: next_id(),
        kind: ProposalType::ThresholdAdjustment,
        target_path: "complexity_thresholds.fast_hi".to_string(),
        current_value: json!(baselines.complexity_thresholds.fast_hi),
        proposed_value: json!(proposed),
        rationale: format!("fast tier failure rate {rate:.2} exceeds threshold {FAST_FAILURE_RATE_THRESHOLD:.2} over {resolved_count} resolved decisions; lowering the fast-tier upper bound"),
        sample_size: resolved_count,
        confidence: confidence(resolved_count, excess, FAST_FAILURE_RATE_THRESHOLD),
        status: ProposalStatus::Proposed,
        parent_baseline_version: baselines.version.clone(),
    })
}

// ============================================================================
// SECTION: Low-Efficiency Band
// ============================================================================

/// Partitions `[0, 1]` into ten complexity deciles and flags any decile
/// whose efficiency falls below the floor with enough sample size
/// (`spec.md` §4.7).
fn detect_low_efficiency_bands(decisions: &[Decision], baselines: &Baselines, next_id: &mut impl FnMut() -> ProposalId) -> Vec<ProposedUpdate> {
    const DECILES: usize = 10;
    let mut bands: Vec<Vec<&Decision>> = vec![Vec::new(); DECILES];
    for decision in decisions {
        let idx = ((decision.complexity * DECILES as f64) as usize).min(DECILES - 1);
        bands[idx].push(decision);
    }

    let mut proposals = Vec::new();
    for (idx, band) in bands.iter().enumerate() {
        let resolved_count = band.iter().filter(|d| d.outcome.is_some()).count() as u64;
        if resolved_count < MIN_SAMPLE {
            continue;
        }
        let Some(eff) = efficiency(band) else {
            continue;
        };
        if eff >= DECILE_EFFICIENCY_FLOOR {
            continue;
        }

        let decile_lo = idx as f64 / DECILES as f64;
        let decile_hi = (idx + 1) as f64 / DECILES as f64;
        let (target_path, current, proposed) = if decile_lo < baselines.complexity_thresholds.fast_hi {
            let current = baselines.complexity_thresholds.fast_hi;
            ("complexity_thresholds.fast_hi".to_string(), current, (current - THRESHOLD_STEP).max(0.01))
        } else {
            let current = baselines.complexity_thresholds.medium_hi;
            ("complexity_thresholds.medium_hi".to_string(), current, (current + THRESHOLD_STEP).min(0.99))
        };

        let excess = DECILE_EFFICIENCY_FLOOR - eff;
        proposals.push(ProposedUpdate {
            id: next_id(),
            kind: ProposalType::ThresholdAdjustment,
            target_path,
            current_value: json!(current),
            proposed_value: json!(proposed),
            rationale: format!("complexity decile [{decile_lo:.1}, {decile_hi:.1}) has efficiency {eff:.2}, below floor {DECILE_EFFICIENCY_FLOOR:.2} over {resolved_count} resolved decisions; narrowing the adjacent boundary"),
            sample_size: resolved_count,
            confidence: confidence(resolved_count, excess, DECILE_EFFICIENCY_FLOOR),
            status: ProposalStatus::Proposed,
            parent_baseline_version: baselines.version.clone(),
        });
    }
    proposals
}

// ============================================================================
// SECTION: Overuse
// ============================================================================

/// A single tier whose share exceeds the target share by margin across the
/// whole window suggests rebalancing is needed (`spec.md` §4.7).
fn detect_overuse(decisions: &[Decision], baselines: &Baselines, next_id: &mut impl FnMut() -> ProposalId) -> Option<ProposedUpdate> {
    if decisions.is_empty() {
        return None;
    }
    let total = decisions.len() as f64;
    let (tier, share) = Tier::ALL
        .iter()
        .map(|tier| (*tier, tier_slice(decisions, *tier).len() as f64 / total))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    if share < OVERUSE_TARGET_SHARE + OVERUSE_MARGIN {
        return None;
    }

    let sample_size = decisions.len() as u64;
    if sample_size < MIN_SAMPLE {
        return None;
    }
    let excess = share - (OVERUSE_TARGET_SHARE + OVERUSE_MARGIN);

    let (target_path, current, proposed) = match tier {
        Tier::Fast => {
            let current = baselines.complexity_thresholds.fast_hi;
            ("complexity_thresholds.fast_hi".to_string(), current, (current - THRESHOLD_STEP).max(0.01))
        }
        Tier::Medium => {
            let current = baselines.complexity_thresholds.medium_hi;
            ("complexity_thresholds.medium_hi".to_string(), current, (current - THRESHOLD_STEP).max(baselines.complexity_thresholds.fast_hi + 0.01))
        }
        Tier::Strong => {
            let current = baselines.complexity_thresholds.medium_hi;
            ("complexity_thresholds.medium_hi".to_string(), current, (current + THRESHOLD_STEP).min(0.99))
        }
    };

    Some(ProposedUpdate {
        id: next_id(),
        kind: ProposalType::ThresholdAdjustment,
        target_path,
        current_value: json!(current),
        proposed_value: json!(proposed),
        rationale: format!("{tier} tier share {share:.2} exceeds target {OVERUSE_TARGET_SHARE:.2} by more than margin {OVERUSE_MARGIN:.2} over the full window; proposing a small rebalancing step"),
        sample_size,
        confidence: confidence(sample_size, excess, OVERUSE_MARGIN),
        status: ProposalStatus::Proposed,
        parent_baseline_version: baselines.version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use kernel_core::Alternative;
    use kernel_core::Baselines;
    use kernel_core::Decision;
    use kernel_core::DecisionId;
    use kernel_core::DqBreakdown;
    use kernel_core::Outcome;
    use kernel_core::QueryHash;
    use kernel_core::Tier;
    use kernel_core::Timestamp;

    use super::PatternDetector;

    fn decision(sequence: u64, tier: Tier, complexity: f64, outcome: Option<Outcome>) -> Decision {
        Decision {
            id: DecisionId::new(),
            ts: Timestamp::new(sequence, 0),
            query_hash: QueryHash::of("q"),
            query_preview: "q".to_string(),
            complexity,
            complexity_rationale: String::new(),
            chosen_tier: tier,
            dq: DqBreakdown {
                total: 0.8,
                validity: 1.0,
                specificity: 1.0,
                correctness: 0.5,
            },
            alternatives: vec![Alternative {
                tier,
                dq: DqBreakdown {
                    total: 0.8,
                    validity: 1.0,
                    specificity: 1.0,
                    correctness: 0.5,
                },
            }],
            cost_estimate: 0.01,
            baseline_version: "1.0.0".to_string(),
            session_id: None,
            overridden: false,
            outcome,
            feedback_ts: None,
        }
    }

    #[test]
    fn single_query_yields_no_proposals() {
        let baselines = Baselines::defaults();
        let decisions = vec![decision(1, Tier::Fast, 0.1, None)];
        let proposals = PatternDetector.detect(&decisions, &baselines, 0);
        assert!(proposals.is_empty());
    }

    #[test]
    fn healthy_medium_tier_yields_no_proposals() {
        let baselines = Baselines::defaults();
        let mut decisions = Vec::new();
        for i in 0..200u64 {
            let outcome = if i < 60 {
                Some(if i < 54 { Outcome::Success } else { Outcome::Failure })
            } else {
                None
            };
            decisions.push(decision(i, Tier::Medium, 0.5, outcome));
        }
        let proposals = PatternDetector.detect(&decisions, &baselines, 0);
        assert!(proposals.is_empty());
    }

    #[test]
    fn struggling_fast_tier_proposes_lowering_its_upper_bound() {
        let baselines = Baselines::defaults();
        let mut decisions = Vec::new();
        for i in 0..42u64 {
            let outcome = if i < 40 { Outcome::Failure } else { Outcome::Success };
            decisions.push(decision(i, Tier::Fast, 0.1, Some(outcome)));
        }
        let proposals = PatternDetector.detect(&decisions, &baselines, 0);
        let threshold_proposal = proposals.iter().find(|p| p.target_path == "complexity_thresholds.fast_hi").expect("expected a fast_hi proposal");
        assert!(threshold_proposal.confidence >= 0.85, "confidence was {}", threshold_proposal.confidence);
        assert!(threshold_proposal.proposed_value.as_f64().expect("number") < baselines.complexity_thresholds.fast_hi);
    }
}
