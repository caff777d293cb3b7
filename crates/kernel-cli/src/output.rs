// kernel-cli/src/output.rs
// ============================================================================
// Module: JSON Output
// Description: One helper for rendering a serializable value to stdout.
// Purpose: Keep every command's success path emitting the same pretty-JSON
// shape (spec.md §6: "Emit JSON Decision", and the supplemental lineage/
// baselines rendering in SPEC_FULL.md §10).
// Dependencies: serde, serde_json
// ============================================================================

use std::io::Write;

use serde::Serialize;

use crate::error::CliError;
use crate::error::CliResult;

/// Writes `value` to stdout as pretty-printed JSON, followed by a newline.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{rendered}")?;
    Ok(())
}

/// Constructs an [`CliError::InvalidInput`] with a formatted message.
pub fn invalid_input(message: impl Into<String>) -> CliError {
    CliError::InvalidInput(message.into())
}
