#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use smartsheet_client::{JobService, JobServiceError, SubmitAccepted, SubmitRequest};
use smartsheet_core::{BatchId, CellCoord, DecodedResults, JobResult, SubmissionMode};
use smartsheet_engine::OrchestratorEvent;
use tokio::sync::{broadcast, Semaphore};

pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Scripted in-memory job service.
///
/// Submit and status answers are popped from queues; once the status
/// queue is empty every status call returns no results. When `gate` is
/// set, status calls wait for a permit before answering; `submit_gate`
/// does the same for submissions.
#[derive(Default)]
pub struct MockService {
    pub submits: Mutex<VecDeque<Result<SubmitAccepted, JobServiceError>>>,
    pub statuses: Mutex<VecDeque<Result<DecodedResults, JobServiceError>>>,
    pub submitted: Mutex<Vec<SubmitRequest>>,
    pub status_calls: AtomicUsize,
    pub gate: Option<Arc<Semaphore>>,
    pub submit_gate: Option<Arc<Semaphore>>,
    pub healthy: bool,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let service = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::new()
        };
        (service, gate)
    }

    pub fn gated_submits() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let service = Self {
            submit_gate: Some(Arc::clone(&gate)),
            ..Self::new()
        };
        (service, gate)
    }

    pub fn accept(self, batch_id: &str, job_count: usize) -> Self {
        self.submits.lock().unwrap().push_back(Ok(SubmitAccepted {
            batch_id: BatchId::from(batch_id),
            job_count,
        }));
        self
    }

    pub fn reject(self, status: u16) -> Self {
        self.submits
            .lock()
            .unwrap()
            .push_back(Err(unavailable(status)));
        self
    }

    pub fn respond(self, entries: &[(usize, usize, &str)]) -> Self {
        self.statuses.lock().unwrap().push_back(Ok(results(entries)));
        self
    }

    pub fn fail_poll(self, status: u16) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .push_back(Err(unavailable(status)));
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobService for MockService {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitAccepted, JobServiceError> {
        self.submitted.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.submit_gate {
            gate.acquire().await.unwrap().forget();
        }
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unavailable(500)))
    }

    async fn status(
        &self,
        _batch_id: &BatchId,
        _mode: SubmissionMode,
    ) -> Result<DecodedResults, JobServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DecodedResults::default()))
    }

    async fn health(&self) -> Result<Value, JobServiceError> {
        if self.healthy {
            Ok(json!({ "status": "ok" }))
        } else {
            Err(unavailable(503))
        }
    }
}

pub fn unavailable(status: u16) -> JobServiceError {
    JobServiceError::ApiError {
        status,
        body: "service unavailable".to_string(),
    }
}

pub fn results(entries: &[(usize, usize, &str)]) -> DecodedResults {
    entries
        .iter()
        .map(|(row, col, value)| (CellCoord::new(*row, *col), JobResult::new(*value, 1)))
        .collect()
}

/// Wait (in paused virtual time) for the next event matching `pred`.
pub async fn next_event<F>(rx: &mut broadcast::Receiver<OrchestratorEvent>, pred: F) -> OrchestratorEvent
where
    F: Fn(&OrchestratorEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let event = rx.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event did not arrive in time")
}

/// Let spawned tasks run to their next suspension point.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
