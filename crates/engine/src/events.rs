//! Lifecycle events broadcast by the orchestrator.
//!
//! Consumers call [`crate::JobOrchestrator::subscribe`] and receive every
//! event emitted after subscribing. A lagging receiver loses the oldest
//! events; the orchestrator never blocks on slow consumers.

use serde::Serialize;
use smartsheet_core::{BatchId, BatchProgress};

/// Broadcast channel capacity for orchestrator events.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A state change or progress report for the current batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// The job service accepted a batch and polling has been scheduled.
    Submitted { batch_id: BatchId, job_count: usize },

    /// A poll tick merged results.
    Progress {
        batch_id: BatchId,
        progress: BatchProgress,
        /// Grid cells whose text changed on this tick.
        written: usize,
    },

    /// A poll tick failed; polling continues on the next tick.
    PollFailed { batch_id: BatchId, error: String },

    /// Every job of the batch has reported.
    Completed { batch_id: BatchId, job_count: usize },

    /// Submission failed; no batch was created.
    Failed { error: String },

    /// Polling was cancelled before the batch completed.
    Stopped { batch_id: BatchId },
}

impl OrchestratorEvent {
    /// The batch this event refers to, when there is one.
    pub fn batch_id(&self) -> Option<&BatchId> {
        match self {
            Self::Submitted { batch_id, .. }
            | Self::Progress { batch_id, .. }
            | Self::PollFailed { batch_id, .. }
            | Self::Completed { batch_id, .. }
            | Self::Stopped { batch_id } => Some(batch_id),
            Self::Failed { .. } => None,
        }
    }

    /// True for events after which the orchestrator stops polling.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Stopped { .. }
        )
    }
}
