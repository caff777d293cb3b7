// kernel-cli/src/env.rs
// ============================================================================
// Module: Environment Configuration
// Description: Reads root directory, log level, and gate overrides from
// `KERNEL_`-prefixed environment variables.
// Purpose: Implement spec.md §6's environment contract.
// Dependencies: kernel-core, std::env
// ============================================================================

//! ## Overview
//! Every `KERNEL_*` variable is read exactly once, at process startup.
//! Gate overrides never mutate a persisted baseline — they only adjust the
//! [`FeedbackGates`] snapshot the current process evaluates against, the way
//! the teacher's `decision-gate-config` environment overrides shadow (but
//! never rewrite) the on-disk config file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use kernel_core::FeedbackGates;

// ============================================================================
// SECTION: Constants
// ============================================================================

const ROOT_VAR: &str = "KERNEL_ROOT";
const LOG_VAR: &str = "KERNEL_LOG";
const DEFAULT_ROOT: &str = "kernel-data";
const DEFAULT_LOG: &str = "info";

// ============================================================================
// SECTION: Root & Log Level
// ============================================================================

/// Resolves the store root directory from `KERNEL_ROOT`, defaulting to
/// `./kernel-data` when unset.
#[must_use]
pub fn root_dir() -> PathBuf {
    std::env::var(ROOT_VAR).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_ROOT))
}

/// Resolves the `tracing-subscriber` filter directive from `KERNEL_LOG`,
/// defaulting to `"info"` when unset.
#[must_use]
pub fn log_filter() -> String {
    std::env::var(LOG_VAR).unwrap_or_else(|_| DEFAULT_LOG.to_string())
}

// ============================================================================
// SECTION: Gate Overrides
// ============================================================================

/// Optional per-field overrides for [`FeedbackGates`], sourced from
/// `KERNEL_GATE_*` environment variables.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GateOverrides {
    min_queries: Option<u64>,
    min_feedback: Option<u64>,
    min_data_quality: Option<f64>,
    recent_sample: Option<u64>,
    rollback_drop_pct: Option<f64>,
    max_updates_per_window: Option<u32>,
    update_window_queries: Option<u64>,
}

impl GateOverrides {
    /// Reads every `KERNEL_GATE_*` variable present in the environment;
    /// malformed values are ignored rather than rejected, since an override
    /// is a convenience, not a validated input channel.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            min_queries: parse_env("KERNEL_GATE_MIN_QUERIES"),
            min_feedback: parse_env("KERNEL_GATE_MIN_FEEDBACK"),
            min_data_quality: parse_env("KERNEL_GATE_MIN_DATA_QUALITY"),
            recent_sample: parse_env("KERNEL_GATE_RECENT_SAMPLE"),
            rollback_drop_pct: parse_env("KERNEL_GATE_ROLLBACK_DROP_PCT"),
            max_updates_per_window: parse_env("KERNEL_GATE_MAX_UPDATES_PER_WINDOW"),
            update_window_queries: parse_env("KERNEL_GATE_UPDATE_WINDOW_QUERIES"),
        }
    }

    /// Applies every set override to `gates` in place, leaving fields with
    /// no matching environment variable untouched.
    pub fn apply(&self, gates: &mut FeedbackGates) {
        if let Some(value) = self.min_queries {
            gates.min_queries = value;
        }
        if let Some(value) = self.min_feedback {
            gates.min_feedback = value;
        }
        if let Some(value) = self.min_data_quality {
            gates.min_data_quality = value;
        }
        if let Some(value) = self.recent_sample {
            gates.recent_sample = value;
        }
        if let Some(value) = self.rollback_drop_pct {
            gates.rollback_drop_pct = value;
        }
        if let Some(value) = self.max_updates_per_window {
            gates.max_updates_per_window = value;
        }
        if let Some(value) = self.update_window_queries {
            gates.update_window_queries = value;
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|raw| raw.parse().ok())
}
