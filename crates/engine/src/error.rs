use smartsheet_client::JobServiceError;
use smartsheet_core::SheetError;

/// Errors surfaced by the orchestrator and the session.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Grid, codec, validation, or job service failure.
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// A `stop()` or a newer submission arrived while this submission was
    /// waiting on the job service; its batch was discarded.
    #[error("Submission was superseded before the job service answered")]
    Superseded,

    /// An environment variable held an unusable value.
    #[error("Invalid configuration for {var}: {message}")]
    Config { var: &'static str, message: String },
}

impl From<JobServiceError> for EngineError {
    fn from(err: JobServiceError) -> Self {
        Self::Sheet(err.into())
    }
}
