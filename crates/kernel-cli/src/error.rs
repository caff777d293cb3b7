// kernel-cli/src/error.rs
// ============================================================================
// Module: CLI Errors
// Description: One error type for every command, mapped to the exit codes
// the CLI surface promises.
// Purpose: Implement the exit-code contract (spec.md §6, §7).
// Dependencies: kernel-analysis, kernel-baselines, kernel-telemetry, thiserror
// ============================================================================

//! ## Overview
//! Every subcommand function returns `CliResult<ExitCode>`. Errors that
//! reach `main` are formatted once and turned into the matching exit code;
//! nothing downstream calls `std::process::exit` directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::process::ExitCode;

use kernel_analysis::GateError;
use kernel_baselines::StoreError;
use kernel_telemetry::TelemetryError;
use thiserror::Error;

use crate::proposals::QueueError;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Malformed or missing CLI input (`spec.md` §6).
pub const EXIT_INPUT_ERROR: u8 = 1;
/// `AutoUpdateGate::apply` reported `GatesUnmet` (`spec.md` §6).
pub const EXIT_GATES_UNMET: u8 = 2;
/// A candidate baseline failed structural validation (`spec.md` §6).
pub const EXIT_VALIDATION_FAILED: u8 = 3;
/// The baseline or telemetry store could not be reached (`spec.md` §6).
pub const EXIT_STORE_UNAVAILABLE: u8 = 4;

// ============================================================================
// SECTION: CLI Error
// ============================================================================

/// Failure modes surfaced by the CLI, each carrying its promised exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// The caller supplied malformed input (bad id, unreadable file, ...).
    #[error("{0}")]
    InvalidInput(String),
    /// A proposal id did not match any proposal known to this root.
    #[error("no proposal found with id {0:?}")]
    UnknownProposal(String),
    /// The telemetry store could not be read or written.
    #[error("telemetry store error: {0}")]
    Telemetry(#[from] TelemetryError),
    /// The baseline store could not be read or written.
    #[error("baseline store error: {0}")]
    Baseline(#[from] StoreError),
    /// The auto-update gate failed for a reason other than unmet gates.
    #[error("gate error: {0}")]
    Gate(#[from] GateError),
    /// The proposal queue could not be read or written.
    #[error("proposal queue error: {0}")]
    Queue(#[from] QueueError),
    /// Reading or writing a CLI-local file (proposal queue, JSON input) failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A JSON payload could not be parsed or rendered.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Maps this error to the exit code `spec.md` §6 promises for it.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidInput(_) | Self::UnknownProposal(_) => EXIT_INPUT_ERROR,
            Self::Baseline(err) | Self::Gate(GateError::Store(err)) => store_error_exit_code(err),
            Self::Telemetry(_) | Self::Queue(_) | Self::Io(_) | Self::Json(_) => EXIT_STORE_UNAVAILABLE,
        }
    }
}

/// Result alias used by every command function.
pub type CliResult<T> = Result<T, CliError>;

/// Distinguishes a validation failure (exit 3) from a store-availability
/// failure (exit 4) within one [`StoreError`].
const fn store_error_exit_code(error: &StoreError) -> u8 {
    match error {
        StoreError::Invalid(_) | StoreError::Patch(_) | StoreError::VersionNotFound(_) => EXIT_VALIDATION_FAILED,
        StoreError::Unavailable(_) | StoreError::Malformed(_) => EXIT_STORE_UNAVAILABLE,
    }
}

/// Writes `message` to stderr and returns the exit code for `error`.
pub fn emit_error(error: &CliError) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "error: {error}");
    ExitCode::from(error.exit_code())
}
