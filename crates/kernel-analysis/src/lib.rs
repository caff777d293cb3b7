// kernel-analysis/src/lib.rs
// ============================================================================
// Module: Kernel Analysis Library
// Description: Public API surface for pattern detection and the auto-update
// gate.
// Purpose: Expose PatternDetector and AutoUpdateGate (spec.md §4.7, §4.8).
// Dependencies: crate::{pattern_detector, gate}
// ============================================================================

//! ## Overview
//! Kernel analysis closes the feedback loop: it reads telemetry (via the
//! caller, which owns a `kernel_telemetry::TelemetryStore`), proposes
//! baseline changes, and validates/applies/rolls them back through a
//! `kernel_baselines::BaselineStore`. Nothing here performs its own IO
//! beyond what `BaselineStore` already does.

pub mod gate;
pub mod pattern_detector;

pub use gate::ApplyResult;
pub use gate::AutoUpdateGate;
pub use gate::GateContext;
pub use gate::GateError;
pub use gate::GateReport;
pub use gate::UnmetGate;
pub use gate::evaluate;
pub use gate::regression_detected;
pub use gate::window_efficiency;
pub use pattern_detector::MIN_SAMPLE;
pub use pattern_detector::PatternDetector;
