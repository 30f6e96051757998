//! Follow a running batch until it finishes.

use std::time::Duration;

use smartsheet_engine::OrchestratorEvent;
use tokio::sync::broadcast::{self, error::RecvError};

/// How watching a batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    Completed { job_count: usize },
    Stopped,
    Failed(String),
    TimedOut,
    Interrupted,
}

/// Log progress events until the batch reaches a terminal event, the
/// deadline passes, or `interrupt` resolves.
pub async fn watch_batch<F>(
    events: &mut broadcast::Receiver<OrchestratorEvent>,
    deadline: Duration,
    interrupt: F,
) -> WatchOutcome
where
    F: std::future::Future<Output = ()>,
{
    let sleep = tokio::time::sleep(deadline);
    tokio::pin!(sleep);
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut sleep => return WatchOutcome::TimedOut,
            _ = &mut interrupt => return WatchOutcome::Interrupted,
            received = events.recv() => match received {
                Ok(OrchestratorEvent::Progress { progress, written, .. }) => {
                    tracing::info!(
                        completed = progress.completed,
                        job_count = progress.job_count,
                        written,
                        "Progress {}%",
                        progress.percent,
                    );
                }
                Ok(OrchestratorEvent::PollFailed { error, .. }) => {
                    tracing::warn!(%error, "Status check failed, retrying");
                }
                Ok(OrchestratorEvent::Completed { job_count, .. }) => {
                    return WatchOutcome::Completed { job_count };
                }
                Ok(OrchestratorEvent::Stopped { .. }) => return WatchOutcome::Stopped,
                Ok(OrchestratorEvent::Failed { error }) => return WatchOutcome::Failed(error),
                Ok(OrchestratorEvent::Submitted { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event receiver lagged");
                }
                Err(RecvError::Closed) => return WatchOutcome::Stopped,
            },
        }
    }
}
