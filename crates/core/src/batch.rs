//! Batch bookkeeping: identity, job count, completion progress, and the
//! results collected so far.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::result::JobResult;
use crate::types::{BatchId, CellCoord, Timestamp};

/// How a batch was submitted; decides which status endpoint serves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// Row labels x column labels, one job per pair.
    Labels,
    /// A full table matrix submitted under a client-generated sheet id.
    Table,
}

/// One submitted unit of work.
///
/// `job_count` is fixed at construction. `completed` never decreases and
/// never exceeds `job_count`.
#[derive(Debug, Clone)]
pub struct Batch {
    id: BatchId,
    mode: SubmissionMode,
    job_count: usize,
    completed: usize,
    results: BTreeMap<CellCoord, JobResult>,
    submitted_at: Timestamp,
}

/// Snapshot of a batch's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub job_count: usize,
    pub completed: usize,
    /// Rounded completion percentage (0-100); 0 for an empty batch.
    pub percent: u8,
}

impl Batch {
    /// A freshly accepted batch with nothing completed, stamped now.
    pub fn new(id: BatchId, mode: SubmissionMode, job_count: usize) -> Self {
        Self {
            id,
            mode,
            job_count,
            completed: 0,
            results: BTreeMap::new(),
            submitted_at: Utc::now(),
        }
    }

    /// Id assigned by the job service (or generated for table runs).
    pub fn id(&self) -> &BatchId {
        &self.id
    }

    pub fn mode(&self) -> SubmissionMode {
        self.mode
    }

    /// Number of jobs the service reported on submission.
    pub fn job_count(&self) -> usize {
        self.job_count
    }

    /// Jobs reported done so far; never exceeds [`Batch::job_count`].
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    /// Every result merged so far, keyed by grid coordinate.
    pub fn results(&self) -> &BTreeMap<CellCoord, JobResult> {
        &self.results
    }

    /// True once every job has reported. An empty batch is complete
    /// immediately.
    pub fn is_complete(&self) -> bool {
        self.completed >= self.job_count
    }

    /// Snapshot of the completion counters.
    pub fn progress(&self) -> BatchProgress {
        let percent = if self.job_count == 0 {
            0
        } else {
            ((self.completed as f64 / self.job_count as f64) * 100.0).round() as u8
        };
        BatchProgress {
            job_count: self.job_count,
            completed: self.completed,
            percent,
        }
    }

    /// Record a completion count reported by a poll, keeping the count
    /// monotonic and capped at `job_count`.
    pub fn record_completed(&mut self, reported: usize) {
        self.completed = self.completed.max(reported).min(self.job_count);
    }

    /// Store a result; returns `true` when the stored value changed.
    pub(crate) fn record_result(&mut self, coord: CellCoord, result: &JobResult) -> bool {
        if self.results.get(&coord) == Some(result) {
            return false;
        }
        self.results.insert(coord, result.clone());
        true
    }
}
