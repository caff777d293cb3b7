// kernel-baselines/src/patch.rs
// ============================================================================
// Module: Dotted-Path Baseline Patching
// Description: Applies a single dotted-key value change to a Baselines' JSON
// representation.
// Purpose: Let ProposedUpdate.target_path (e.g. "complexity_thresholds.fast_hi")
// drive a structural mutation without PatternDetector depending on Baselines'
// Rust layout.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! `ProposedUpdate` carries a dotted `target_path` and a `proposed_value`
//! (`spec.md` §3). This module walks a `Baselines` value serialized to JSON,
//! replaces the value at that path, and hands the result back for
//! deserialization and validation by the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure applying a dotted-path patch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// `target_path` was empty.
    #[error("target_path must not be empty")]
    EmptyPath,
    /// An intermediate path segment did not resolve to a JSON object.
    #[error("path segment {0:?} does not resolve to an object")]
    NotAnObject(String),
    /// The final path segment does not exist on the target object.
    #[error("unknown field {0:?}")]
    UnknownField(String),
}

// ============================================================================
// SECTION: Patch Application
// ============================================================================

/// Sets the value at `path` (dot-separated, e.g. `"cost_per_mtok.fast.input"`)
/// within `root`, which must already contain that key (patches may only
/// change values, never introduce new fields).
///
/// # Errors
///
/// Returns [`PatchError`] when `path` is empty, traverses through a
/// non-object, or names a field absent from `root`.
pub fn apply_patch(root: &mut Value, path: &str, new_value: Value) -> Result<(), PatchError> {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, ancestors)) = segments.split_last() else {
        return Err(PatchError::EmptyPath);
    };
    if last.is_empty() {
        return Err(PatchError::EmptyPath);
    }

    let mut cursor = root;
    for segment in ancestors {
        cursor = cursor.get_mut(*segment).ok_or_else(|| PatchError::UnknownField((*segment).to_string()))?;
        if !cursor.is_object() {
            return Err(PatchError::NotAnObject((*segment).to_string()));
        }
    }

    let object = cursor.as_object_mut().ok_or_else(|| PatchError::NotAnObject(last.to_string()))?;
    if !object.contains_key(*last) {
        return Err(PatchError::UnknownField((*last).to_string()));
    }
    object.insert((*last).to_string(), new_value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::PatchError;
    use super::apply_patch;

    #[test]
    fn patches_a_nested_field() {
        let mut root = json!({"complexity_thresholds": {"fast_hi": 0.25, "medium_hi": 0.70}});
        apply_patch(&mut root, "complexity_thresholds.fast_hi", json!(0.23)).expect("patch applies");
        assert_eq!(root["complexity_thresholds"]["fast_hi"], json!(0.23));
        assert_eq!(root["complexity_thresholds"]["medium_hi"], json!(0.70));
    }

    #[test]
    fn rejects_unknown_field() {
        let mut root = json!({"complexity_thresholds": {"fast_hi": 0.25}});
        let err = apply_patch(&mut root, "complexity_thresholds.nonexistent", json!(1)).unwrap_err();
        assert_eq!(err, PatchError::UnknownField("nonexistent".to_string()));
    }

    #[test]
    fn rejects_empty_path() {
        let mut root = json!({});
        assert_eq!(apply_patch(&mut root, "", json!(1)).unwrap_err(), PatchError::EmptyPath);
    }

    #[test]
    fn patches_a_triply_nested_field() {
        let mut root = json!({"cost_per_mtok": {"fast": {"input": 0.25, "output": 1.25}}});
        apply_patch(&mut root, "cost_per_mtok.fast.input", json!(0.30)).expect("patch applies");
        assert_eq!(root["cost_per_mtok"]["fast"]["input"], json!(0.30));
    }
}
