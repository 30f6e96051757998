//! Batch lifecycle state machine.
//!
//! ```text
//! Idle -> Submitting -> Polling -> Complete
//!             |            |
//!             +-> Error    +-> (poll failures stay in Polling)
//! ```
//!
//! `stop()` returns to `Idle` from any state. A new `submit()` stops the
//! previous batch first, so at most one batch is ever live.
//!
//! Tracker state sits behind a `std::sync::Mutex` that is never held
//! across an `.await`, which keeps `stop()` synchronous. Poll responses
//! are applied only while the orchestrator is `Polling` the same batch
//! id; anything else is a late response and is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use smartsheet_client::{JobService, SubmitRequest};
use smartsheet_core::codec::export_results_json;
use smartsheet_core::{
    merge_results, Batch, BatchId, BatchProgress, GridStore, MergeReport, SheetError, SheetResult,
};
use tokio::sync::broadcast;

use crate::error::EngineError;
use crate::events::{OrchestratorEvent, EVENT_CHANNEL_CAPACITY};
use crate::poller::PollHandle;

/// Grid shared between a session and its orchestrator.
pub type SharedGrid = Arc<Mutex<GridStore>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Submitting,
    Polling,
    Complete,
    Error,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// What one poll tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Results merged; the batch is still running.
    Merged(MergeReport),
    /// Results merged and the batch is now complete.
    Completed(MergeReport),
    /// A previous poll for this batch has not answered yet.
    InFlight,
    /// The batch is no longer being polled; nothing was applied.
    Stale,
    /// The status request failed; polling continues.
    Failed,
}

/// Drives one batch at a time through submit, poll, merge and completion.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct JobOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    service: Arc<dyn JobService>,
    grid: SharedGrid,
    poll_interval: Duration,
    tracker: Mutex<Tracker>,
    event_tx: broadcast::Sender<OrchestratorEvent>,
}

#[derive(Default)]
struct Tracker {
    state: RunState,
    batch: Option<Batch>,
    poll: Option<PollHandle>,
    /// Batch whose status request is outstanding.
    in_flight: Option<BatchId>,
    /// Bumped by every submit and stop; a submission whose epoch moved on
    /// while it awaited the service is discarded.
    epoch: u64,
    last_error: Option<String>,
}

impl Tracker {
    /// The batch being polled, if it is `batch_id`.
    fn polling(&self, batch_id: &BatchId) -> Option<&Batch> {
        if self.state != RunState::Polling {
            return None;
        }
        self.batch.as_ref().filter(|batch| batch.id() == batch_id)
    }
}

/// Clears `Tracker::in_flight` when the status request ends, including
/// when the tick future is dropped mid-request.
struct InFlightGuard<'a> {
    tracker: &'a Mutex<Tracker>,
    batch_id: &'a BatchId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut tracker = lock(self.tracker);
        if tracker.in_flight.as_ref() == Some(self.batch_id) {
            tracker.in_flight = None;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JobOrchestrator {
    pub fn new(service: Arc<dyn JobService>, grid: SharedGrid, poll_interval: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                service,
                grid,
                poll_interval,
                tracker: Mutex::new(Tracker::default()),
                event_tx,
            }),
        }
    }

    /// Subscribe to lifecycle events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn state(&self) -> RunState {
        lock(&self.inner.tracker).state
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// Id of the current (or most recent) batch.
    pub fn batch_id(&self) -> Option<BatchId> {
        lock(&self.inner.tracker)
            .batch
            .as_ref()
            .map(|batch| batch.id().clone())
    }

    /// Snapshot of the current (or most recent) batch.
    pub fn batch(&self) -> Option<Batch> {
        lock(&self.inner.tracker).batch.clone()
    }

    pub fn progress(&self) -> Option<BatchProgress> {
        lock(&self.inner.tracker).batch.as_ref().map(Batch::progress)
    }

    /// Message of the last submission failure, cleared on the next submit.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.inner.tracker).last_error.clone()
    }

    /// Pretty JSON of the current batch's results; `None` before the
    /// first successful submission.
    pub fn export_results_json(&self) -> SheetResult<Option<String>> {
        lock(&self.inner.tracker)
            .batch
            .as_ref()
            .map(export_results_json)
            .transpose()
    }

    /// Submit a new batch, stopping any batch that is still live.
    ///
    /// On success the orchestrator is `Polling` (or already `Complete`
    /// for a batch of zero jobs). On a service failure it is `Error` and
    /// no batch exists.
    pub async fn submit(&self, request: SubmitRequest) -> Result<BatchId, EngineError> {
        validate(&request)?;

        let epoch = {
            let mut tracker = lock(&self.inner.tracker);
            self.inner.stop_locked(&mut tracker);
            tracker.state = RunState::Submitting;
            tracker.batch = None;
            tracker.last_error = None;
            tracker.epoch
        };

        let mode = request.mode();
        tracing::info!(?mode, "Submitting batch");
        let response = self.inner.service.submit(&request).await;

        let mut tracker = lock(&self.inner.tracker);
        if tracker.epoch != epoch {
            tracing::info!(?mode, "Discarding submission superseded while in flight");
            return Err(EngineError::Superseded);
        }

        let accepted = match response {
            Ok(accepted) => accepted,
            Err(e) => {
                let err = SheetError::from(e);
                tracing::error!(?mode, error = %err, "Batch submission failed");
                tracker.state = RunState::Error;
                tracker.last_error = Some(err.to_string());
                self.inner.emit(OrchestratorEvent::Failed {
                    error: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let batch = Batch::new(accepted.batch_id.clone(), mode, accepted.job_count);
        tracing::info!(
            batch_id = %accepted.batch_id,
            job_count = accepted.job_count,
            "Batch submitted",
        );
        self.inner.emit(OrchestratorEvent::Submitted {
            batch_id: accepted.batch_id.clone(),
            job_count: accepted.job_count,
        });

        if batch.is_complete() {
            tracker.state = RunState::Complete;
            self.inner.emit(OrchestratorEvent::Completed {
                batch_id: accepted.batch_id.clone(),
                job_count: 0,
            });
        } else {
            tracker.state = RunState::Polling;
            tracker.poll = Some(Inner::spawn_poller(&self.inner, accepted.batch_id.clone()));
        }
        tracker.batch = Some(batch);

        Ok(accepted.batch_id)
    }

    /// Cancel polling and return to `Idle`. A response still in flight is
    /// discarded when it arrives. The last batch stays readable.
    pub fn stop(&self) {
        let mut tracker = lock(&self.inner.tracker);
        self.inner.stop_locked(&mut tracker);
    }

    /// Poll the current batch immediately, outside the timer.
    pub async fn refresh(&self) -> TickOutcome {
        let batch_id = {
            let tracker = lock(&self.inner.tracker);
            match (tracker.state, tracker.batch.as_ref()) {
                (RunState::Polling, Some(batch)) => batch.id().clone(),
                _ => return TickOutcome::Stale,
            }
        };
        self.inner.tick(&batch_id).await
    }
}

impl Inner {
    fn emit(&self, event: OrchestratorEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    fn spawn_poller(this: &Arc<Self>, batch_id: BatchId) -> PollHandle {
        let weak = Arc::downgrade(this);
        PollHandle::spawn(this.poll_interval, move || {
            let weak = weak.clone();
            let batch_id = batch_id.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.tick(&batch_id).await;
                }
            }
        })
    }

    fn stop_locked(&self, tracker: &mut Tracker) {
        tracker.epoch += 1;
        tracker.in_flight = None;

        if let Some(poll) = tracker.poll.take() {
            poll.cancel();
            if let Some(batch) = &tracker.batch {
                tracing::info!(
                    batch_id = %batch.id(),
                    completed = batch.completed(),
                    job_count = batch.job_count(),
                    "Polling stopped",
                );
                self.emit(OrchestratorEvent::Stopped {
                    batch_id: batch.id().clone(),
                });
            }
        }
        tracker.state = RunState::Idle;
    }

    /// One poll cycle: fetch status, merge, detect completion.
    async fn tick(&self, batch_id: &BatchId) -> TickOutcome {
        let mode = {
            let mut tracker = lock(&self.tracker);
            let Some(batch) = tracker.polling(batch_id) else {
                return TickOutcome::Stale;
            };
            let mode = batch.mode();
            if tracker.in_flight.is_some() {
                tracing::debug!(batch_id = %batch_id, "Previous poll still in flight, skipping tick");
                return TickOutcome::InFlight;
            }
            tracker.in_flight = Some(batch_id.clone());
            mode
        };

        let in_flight = InFlightGuard {
            tracker: &self.tracker,
            batch_id,
        };
        let response = self.service.status(batch_id, mode).await;
        drop(in_flight);

        let mut tracker = lock(&self.tracker);
        if tracker.polling(batch_id).is_none() {
            tracing::debug!(batch_id = %batch_id, "Discarding poll response for inactive batch");
            return TickOutcome::Stale;
        }

        let decoded = match response {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(batch_id = %batch_id, error = %e, "Poll failed, retrying on next tick");
                self.emit(OrchestratorEvent::PollFailed {
                    batch_id: batch_id.clone(),
                    error: e.to_string(),
                });
                return TickOutcome::Failed;
            }
        };

        let Tracker {
            state, batch, poll, ..
        } = &mut *tracker;
        let Some(batch) = batch.as_mut() else {
            return TickOutcome::Stale;
        };

        let report = {
            let mut grid = lock(&self.grid);
            merge_results(batch, &decoded, &mut grid)
        };
        tracing::debug!(
            batch_id = %batch_id,
            merged = report.merged,
            written = report.written,
            out_of_range = report.out_of_range,
            malformed = report.malformed,
            completed = report.completed,
            job_count = batch.job_count(),
            "Merged poll results",
        );
        self.emit(OrchestratorEvent::Progress {
            batch_id: batch_id.clone(),
            progress: batch.progress(),
            written: report.written,
        });

        if !batch.is_complete() {
            return TickOutcome::Merged(report);
        }

        *state = RunState::Complete;
        if let Some(poll) = poll.take() {
            poll.cancel();
        }
        tracing::info!(batch_id = %batch_id, job_count = batch.job_count(), "Batch complete");
        self.emit(OrchestratorEvent::Completed {
            batch_id: batch_id.clone(),
            job_count: batch.job_count(),
        });
        TickOutcome::Completed(report)
    }
}

fn validate(request: &SubmitRequest) -> SheetResult<()> {
    match request {
        SubmitRequest::Labels { rows, .. } if rows.is_empty() => Err(SheetError::Validation(
            "Please enter at least one item in the first column".into(),
        )),
        SubmitRequest::Labels { cols, .. } if cols.is_empty() => Err(SheetError::Validation(
            "Please enter at least one attribute in the first row".into(),
        )),
        SubmitRequest::Table { table, .. } if table.len() < 2 => Err(SheetError::Validation(
            "Table needs a header row and at least one data row".into(),
        )),
        _ => Ok(()),
    }
}
