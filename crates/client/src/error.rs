use smartsheet_core::SheetError;

/// Errors from the job service transport.
#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    /// The HTTP request itself failed (network, DNS, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The job service returned a non-2xx status code.
    #[error("Job service error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response parsed but is missing something the client needs.
    #[error("Unexpected job service response: {0}")]
    InvalidResponse(String),
}

impl From<JobServiceError> for SheetError {
    fn from(err: JobServiceError) -> Self {
        SheetError::ServiceUnavailable(err.to_string())
    }
}
