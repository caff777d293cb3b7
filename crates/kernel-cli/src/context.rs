// kernel-cli/src/context.rs
// ============================================================================
// Module: CLI Context
// Description: Opens every store a command might need, rooted at one
// directory.
// Purpose: Centralize the KERNEL_ROOT-derived layout (spec.md §6's
// "persisted layout") so no command hand-rolls its own paths.
// Dependencies: kernel-baselines, kernel-telemetry, kernel-cli::proposals
// ============================================================================

use std::path::Path;

use kernel_baselines::BaselineStore;
use kernel_telemetry::TelemetryStore;

use crate::error::CliResult;
use crate::proposals::ProposalQueue;

/// Bundles the stores every subcommand draws on, all rooted under the same
/// `KERNEL_ROOT` directory.
pub struct Context {
    pub baselines: BaselineStore,
    pub telemetry: TelemetryStore,
    pub proposals: ProposalQueue,
}

impl Context {
    /// Opens every store rooted at `root`, rebuilding telemetry aggregates
    /// from whatever events already exist on disk.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::CliError::Telemetry`] if the event log
    /// exists but cannot be read.
    pub fn open(root: &Path) -> CliResult<Self> {
        let baselines = BaselineStore::new(root.join("baselines"));
        let telemetry = TelemetryStore::open(root.join("events"))?;
        let proposals = ProposalQueue::new(root.to_path_buf());
        Ok(Self {
            baselines,
            telemetry,
            proposals,
        })
    }
}
