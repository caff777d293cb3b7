// kernel-telemetry/src/log.rs
// ============================================================================
// Module: Append-Only Event Log
// Description: Day-partitioned, crash-safe JSONL event log.
// Purpose: Implement the append-only raw event storage backing TelemetryStore
// (spec.md §4.2, §6).
// Dependencies: kernel-telemetry::event, serde_json
// ============================================================================

//! ## Overview
//! Each day's events live in their own file, `events-<day_index>.jsonl`, one
//! JSON object per line. Appends open the file in append mode, write one
//! line, and `sync_all` before returning — durability is required before
//! `Router::route`'s caller sees a result (`spec.md` §4.2(a)).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::event::EventEnvelope;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure reading or appending to the event log.
#[derive(Debug, Error)]
pub enum LogError {
    /// The underlying file could not be read or written.
    #[error("event log io error: {0}")]
    Io(String),
    /// A stored line was not valid [`EventEnvelope`] JSON.
    #[error("malformed event record: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Event Log
// ============================================================================

/// Append-only, day-partitioned event log rooted at a directory.
#[derive(Debug, Clone)]
pub struct EventLog {
    root: PathBuf,
}

impl EventLog {
    /// Opens (without yet creating) a log rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Appends `envelope`, durably, to the partition for its day.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] when the file cannot be created, written, or
    /// flushed.
    pub fn append(&self, envelope: &EventEnvelope) -> Result<(), LogError> {
        fs::create_dir_all(&self.root).map_err(|err| LogError::Io(err.to_string()))?;
        let path = self.partition_path(envelope.day_index());
        let mut file = OpenOptions::new().create(true).append(true).open(&path).map_err(|err| LogError::Io(err.to_string()))?;
        let mut line = serde_json::to_string(envelope).map_err(|err| LogError::Malformed(err.to_string()))?;
        line.push('\n');
        file.write_all(line.as_bytes()).map_err(|err| LogError::Io(err.to_string()))?;
        file.sync_all().map_err(|err| LogError::Io(err.to_string()))?;
        Ok(())
    }

    /// Reads every event across every day partition, in file-listing order
    /// (partitions are read oldest-day-first; within a partition, append
    /// order is preserved). Used by `rebuild_from_events` and by store
    /// initialization to rebuild in-memory aggregates.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] when the directory cannot be listed, or
    /// [`LogError::Malformed`] when a stored line fails to parse.
    pub fn read_all(&self) -> Result<Vec<EventEnvelope>, LogError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut partitions: Vec<PathBuf> = fs::read_dir(&self.root)
            .map_err(|err| LogError::Io(err.to_string()))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
            .collect();
        partitions.sort();

        let mut events = Vec::new();
        for partition in partitions {
            events.extend(read_partition(&partition)?);
        }
        events.sort_by_key(|event| event.sequence);
        Ok(events)
    }

    fn partition_path(&self, day_index: i64) -> PathBuf {
        self.root.join(format!("events-{day_index}.jsonl"))
    }
}

fn read_partition(path: &Path) -> Result<Vec<EventEnvelope>, LogError> {
    let file = File::open(path).map_err(|err| LogError::Io(err.to_string()))?;
    BufReader::new(file)
        .lines()
        .filter_map(|line| match line {
            Ok(text) if text.trim().is_empty() => None,
            Ok(text) => Some(serde_json::from_str::<EventEnvelope>(&text).map_err(|err| LogError::Malformed(err.to_string()))),
            Err(err) => Some(Err(LogError::Io(err.to_string()))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use kernel_core::DecisionId;
    use kernel_core::Outcome;
    use tempfile::tempdir;

    use super::EventLog;
    use crate::event::EventEnvelope;
    use crate::event::EventPayload;

    fn sample(sequence: u64, wall_unix_ms: i64) -> EventEnvelope {
        EventEnvelope::new(
            sequence,
            wall_unix_ms,
            "1.0.0".to_string(),
            EventPayload::OutcomeAttached {
                decision_id: DecisionId::new(),
                outcome: Outcome::Success,
                feedback_ts: wall_unix_ms,
                match_confidence: 1.0,
            },
        )
    }

    #[test]
    fn appended_events_round_trip_in_sequence_order() {
        let dir = tempdir().expect("tempdir");
        let log = EventLog::new(dir.path());
        log.append(&sample(2, 0)).expect("append");
        log.append(&sample(1, 0)).expect("append");
        let events = log.read_all().expect("read_all");
        assert_eq!(events.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn events_on_different_days_land_in_different_partitions() {
        let dir = tempdir().expect("tempdir");
        let log = EventLog::new(dir.path());
        log.append(&sample(1, 0)).expect("append");
        log.append(&sample(2, 86_400_000)).expect("append");
        let partitions: Vec<_> = std::fs::read_dir(dir.path()).expect("read_dir").filter_map(Result::ok).collect();
        assert_eq!(partitions.len(), 2);
    }

    #[test]
    fn reading_an_empty_log_returns_no_events() {
        let dir = tempdir().expect("tempdir");
        let log = EventLog::new(dir.path().join("nonexistent"));
        assert!(log.read_all().expect("read_all").is_empty());
    }
}
