// kernel-cli/src/proposals.rs
// ============================================================================
// Module: Proposal Queue
// Description: Durable holding area for ProposedUpdates between `propose`
// and `apply`/`rollback`.
// Purpose: PatternDetector is pure and returns proposals in memory; the CLI
// is the first caller that needs to look one up again by id in a later
// invocation, so it persists the queue itself.
// Dependencies: kernel-core, serde_json, tempfile
// ============================================================================

//! ## Overview
//! `kernel-analysis` never touches disk (grounded on its own module
//! overview). The CLI's `propose` command is the boundary where a
//! [`ProposedUpdate`] first needs a durable home so a later `apply
//! <proposal_id>` invocation, in a different process, can find it again.
//! This mirrors `kernel-baselines::store`'s write-to-temp-then-rename
//! idiom, scoped to one flat file rather than a version series.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use kernel_core::ProposalStatus;
use kernel_core::ProposedUpdate;

// ============================================================================
// SECTION: Proposal Queue
// ============================================================================

/// File-backed store for proposals awaiting an `apply` or `rollback` call.
#[derive(Debug, Clone)]
pub struct ProposalQueue {
    path: PathBuf,
}

impl ProposalQueue {
    /// Opens the queue file under `root` (created on first write).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            path: root.into().join("proposals.json"),
        }
    }

    /// Returns every proposal currently recorded, in the order they were
    /// appended.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error if the file exists but cannot be parsed.
    pub fn load(&self) -> Result<Vec<ProposedUpdate>, QueueError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Appends `new_proposals` to the queue, persisting the result
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error if the queue cannot be read or written.
    pub fn append(&self, new_proposals: Vec<ProposedUpdate>) -> Result<(), QueueError> {
        let mut all = self.load()?;
        all.extend(new_proposals);
        self.persist(&all)
    }

    /// Finds a proposal by its canonical string id (`ProposalId::as_str`).
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error if the queue cannot be read.
    pub fn find(&self, proposal_id: &str) -> Result<Option<ProposedUpdate>, QueueError> {
        Ok(self.load()?.into_iter().find(|proposal| proposal.id.as_str() == proposal_id))
    }

    /// Overwrites the stored status of the proposal matching `proposal_id`.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error if the queue cannot be read or written.
    pub fn set_status(&self, proposal_id: &str, status: ProposalStatus) -> Result<(), QueueError> {
        let mut all = self.load()?;
        for proposal in &mut all {
            if proposal.id.as_str() == proposal_id {
                proposal.status = status;
            }
        }
        self.persist(&all)
    }

    fn persist(&self, proposals: &[ProposedUpdate]) -> Result<(), QueueError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let bytes = serde_json::to_vec_pretty(proposals)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&self.path).map_err(|err| QueueError::Io(err.error))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure modes for [`ProposalQueue`] operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue file could not be read or written.
    #[error("proposal queue io error: {0}")]
    Io(#[from] std::io::Error),
    /// The queue file was not valid JSON.
    #[error("proposal queue json error: {0}")]
    Json(#[from] serde_json::Error),
}
