// kernel-baselines/src/store.rs
// ============================================================================
// Module: Baseline Store
// Description: Durable, versioned Baselines persistence with lineage.
// Purpose: Implement BaselineStore (spec.md §4.1): Load, ApplyUpdate,
// Rollback, Lineage.
// Dependencies: kernel-core, tempfile, serde_json, tracing
// ============================================================================

//! ## Overview
//! Each version of `Baselines` lives in its own file, `baselines.vN.json`,
//! under the store's root directory. A `baselines.current` symlink points at
//! the file currently in effect; swapping the symlink is the atomic "commit"
//! of a version change (`spec.md` §6's persisted layout). `Load` falls back
//! to [`Baselines::defaults`] plus a `LOADFAIL` log event when the pointer or
//! its target is missing, unreadable, or fails structural validation
//! (`spec.md` §7).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use kernel_core::Baselines;
use kernel_core::BaselinesError;
use kernel_core::LineageEntry;
use kernel_core::ProposedUpdate;
use thiserror::Error;

use crate::patch::PatchError;
use crate::patch::apply_patch;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure modes for [`BaselineStore`] write operations (`spec.md` §4.1, §7).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The patched candidate failed a structural invariant.
    #[error("baseline validation failed: {0}")]
    Invalid(#[from] BaselinesError),
    /// The proposal's `target_path` could not be applied.
    #[error("patch failed: {0}")]
    Patch(#[from] PatchError),
    /// The underlying file could not be written after retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// `Rollback` was asked for a version with no on-disk file.
    #[error("no stored baseline for version {0:?}")]
    VersionNotFound(String),
    /// A stored baseline file was not valid JSON for [`Baselines`].
    #[error("malformed baseline file: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Apply Outcome
// ============================================================================

/// Result of [`BaselineStore::apply_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// `dry_run = true`: the candidate Baselines that *would* be written,
    /// plus the path of the version it would supersede.
    Preview {
        /// The candidate Baselines, not yet persisted.
        proposed: Baselines,
        /// Path of the file holding the version being superseded.
        backup_path: PathBuf,
    },
    /// `dry_run = false`: the candidate was persisted and is now current.
    Applied(Baselines),
}

// ============================================================================
// SECTION: Baseline Store
// ============================================================================

/// File-backed, versioned store for the single [`Baselines`] singleton.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    root: PathBuf,
}

impl BaselineStore {
    /// Opens a store rooted at `root`. The directory is created if absent.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Loads the current [`Baselines`]. Never fails: an unreadable,
    /// missing, or invalid store falls back to [`Baselines::defaults`] and
    /// emits a `LOADFAIL` log event (`spec.md` §4.1, §7).
    #[must_use]
    pub fn load(&self) -> Baselines {
        match self.try_load() {
            Ok(baselines) => baselines,
            Err(err) => {
                tracing::warn!(error = %err, root = %self.root.display(), "LOADFAIL: falling back to default baselines");
                Baselines::defaults()
            }
        }
    }

    /// Returns the current lineage, or an empty vector if the store has
    /// never been initialized (in which case `load()` would also fall back
    /// to defaults, whose lineage is empty).
    #[must_use]
    pub fn lineage(&self) -> Vec<LineageEntry> {
        self.load().lineage
    }

    /// Reads a previously stored historical version without making it
    /// current, for operator inspection (`spec.md` §6: "print current or
    /// historical Baselines").
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionNotFound`] when no file exists for
    /// `version`.
    pub fn load_version(&self, version: &str) -> Result<Baselines, StoreError> {
        let path = self.path_for_version(version);
        self.read_baselines_file(&path).map_err(|_| StoreError::VersionNotFound(version.to_string()))
    }

    /// Applies `update.proposed_value` at `update.target_path`, producing a
    /// new version. With `dry_run = true`, returns [`ApplyOutcome::Preview`]
    /// without touching disk. With `dry_run = false`, validates, persists,
    /// and swaps the `baselines.current` pointer atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Patch`] when `target_path` cannot be resolved,
    /// [`StoreError::Invalid`] when the patched candidate fails validation,
    /// or [`StoreError::Unavailable`] when persistence fails.
    pub fn apply_update(&self, update: &ProposedUpdate, dry_run: bool) -> Result<ApplyOutcome, StoreError> {
        let current = self.load();
        let backup_path = self.path_for_version(&current.version);

        let candidate = self.build_candidate(&current, update)?;
        candidate.validate()?;

        if dry_run {
            return Ok(ApplyOutcome::Preview {
                proposed: candidate,
                backup_path,
            });
        }

        self.write_version_file(&current)?;
        self.persist(&candidate)?;
        Ok(ApplyOutcome::Applied(candidate))
    }

    /// Restores the configuration content (everything but `version` and
    /// `lineage`) of a previously stored `version`, appending a rollback
    /// entry rather than literally reverting the version counter —
    /// lineage must keep strictly increasing (`spec.md` §8 invariant 3)
    /// even when a rollback is "undoing" a change.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionNotFound`] when no file exists for
    /// `version`, or [`StoreError::Unavailable`] when persistence fails.
    pub fn rollback(&self, version: &str) -> Result<Baselines, StoreError> {
        let target_path = self.path_for_version(version);
        let restored = self.read_baselines_file(&target_path).map_err(|_| StoreError::VersionNotFound(version.to_string()))?;

        let current = self.load();
        let next_version = bump_version(&current.version);
        let mut candidate = restored;
        candidate.version = next_version;
        candidate.lineage = current.lineage;
        candidate.lineage.push(LineageEntry {
            version: candidate.version.clone(),
            applied_at_unix_ms: now_unix_ms(),
            proposal_id: None,
            rationale: format!("rollback to baseline {version}"),
            author: "auto_update_gate".to_string(),
        });
        candidate.validate()?;
        self.persist(&candidate)?;
        Ok(candidate)
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    fn build_candidate(&self, current: &Baselines, update: &ProposedUpdate) -> Result<Baselines, StoreError> {
        let mut json = serde_json::to_value(current).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        apply_patch(&mut json, &update.target_path, update.proposed_value.clone())?;

        let mut candidate: Baselines = serde_json::from_value(json).map_err(|err| StoreError::Malformed(err.to_string()))?;
        candidate.version = bump_version(&current.version);
        candidate.lineage.push(LineageEntry {
            version: candidate.version.clone(),
            applied_at_unix_ms: now_unix_ms(),
            proposal_id: Some(update.id.as_str()),
            rationale: update.rationale.clone(),
            author: "auto_update_gate".to_string(),
        });
        Ok(candidate)
    }

    fn try_load(&self) -> Result<Baselines, StoreError> {
        let pointer = self.current_pointer();
        let target = self.resolve_pointer(&pointer)?;
        let baselines = self.read_baselines_file(&target)?;
        baselines.validate()?;
        Ok(baselines)
    }

    #[cfg(unix)]
    fn resolve_pointer(&self, pointer: &Path) -> Result<PathBuf, StoreError> {
        let link = fs::read_link(pointer).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(if link.is_absolute() {
            link
        } else {
            self.root.join(link)
        })
    }

    #[cfg(not(unix))]
    fn resolve_pointer(&self, pointer: &Path) -> Result<PathBuf, StoreError> {
        let version = fs::read_to_string(pointer).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(self.path_for_version(version.trim()))
    }

    fn read_baselines_file(&self, path: &Path) -> Result<Baselines, StoreError> {
        let bytes = fs::read(path).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| StoreError::Malformed(err.to_string()))
    }

    fn persist(&self, baselines: &Baselines) -> Result<(), StoreError> {
        self.write_version_file(baselines)?;
        self.swap_current_pointer(&baselines.version)?;
        tracing::info!(version = %baselines.version, "baseline persisted");
        Ok(())
    }

    /// Writes `baselines` to its own `baselines.vN.json`, without touching
    /// the `baselines.current` pointer. Used both by `persist` (which swaps
    /// the pointer right after) and by `apply_update`, which must back up
    /// the pre-apply version before bumping to the candidate — a version
    /// loaded via [`Baselines::defaults`] is never written to disk on its
    /// own, so without this the first apply against a fresh store would
    /// leave its own pre-apply version unreachable by `rollback`/
    /// `load_version`.
    fn write_version_file(&self, baselines: &Baselines) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let bytes = serde_json::to_vec_pretty(baselines).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let target = self.path_for_version(&baselines.version);
        write_atomic(&self.root, &target, &bytes)
    }

    #[cfg(unix)]
    fn swap_current_pointer(&self, version: &str) -> Result<(), StoreError> {
        let pointer = self.current_pointer();
        let staged = self.root.join(format!(".baselines.current.{version}.tmp"));
        let _ = fs::remove_file(&staged);
        std::os::unix::fs::symlink(version_file_name(version), &staged).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        fs::rename(&staged, &pointer).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn swap_current_pointer(&self, version: &str) -> Result<(), StoreError> {
        write_atomic(&self.root, &self.current_pointer(), version.as_bytes())
    }

    fn current_pointer(&self) -> PathBuf {
        self.root.join("baselines.current")
    }

    fn path_for_version(&self, version: &str) -> PathBuf {
        self.root.join(version_file_name(version))
    }
}

fn version_file_name(version: &str) -> String {
    format!("baselines.v{version}.json")
}

/// Writes `bytes` to `target` via a temp file in the same directory, then
/// renames into place — never leaves a partial file on crash
/// (`spec.md` §4.1: "write-to-temp + rename").
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|err| StoreError::Unavailable(err.to_string()))?;
    std::io::Write::write_all(&mut tmp, bytes).map_err(|err| StoreError::Unavailable(err.to_string()))?;
    tmp.persist(target).map_err(|err| StoreError::Unavailable(err.error.to_string()))?;
    Ok(())
}

/// Increments the last dotted segment of a version string, e.g.
/// `"1.4.2" -> "1.4.3"`.
fn bump_version(version: &str) -> String {
    let mut parts: Vec<String> = version.split('.').map(str::to_string).collect();
    if let Some(last) = parts.last_mut() {
        let next: u64 = last.parse::<u64>().unwrap_or(0) + 1;
        *last = next.to_string();
    }
    parts.join(".")
}

fn now_unix_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}
