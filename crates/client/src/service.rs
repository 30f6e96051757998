use async_trait::async_trait;
use serde_json::Value;
use smartsheet_core::{BatchId, DecodedResults, SubmissionMode};

use crate::error::JobServiceError;
use crate::models::{SubmitAccepted, SubmitRequest};

/// Remote batch-computation service.
///
/// Implementations must be cheap to share; the orchestrator holds one
/// behind an `Arc` and calls it from its polling task.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Submit a batch and return the id to poll plus the number of jobs.
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitAccepted, JobServiceError>;

    /// Fetch every result the service has finished for `batch_id` so far.
    async fn status(
        &self,
        batch_id: &BatchId,
        mode: SubmissionMode,
    ) -> Result<DecodedResults, JobServiceError>;

    /// Probe service liveness.
    async fn health(&self) -> Result<Value, JobServiceError>;
}
