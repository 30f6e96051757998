/// Errors raised by the grid, the codec, and the submission pipeline.
///
/// `OutOfRange`, `InvalidTarget` and `Validation` block the attempted
/// operation. `ServiceUnavailable` aborts a submission but is only
/// reported during polling. `Decode` is swallowed per result entry.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Cannot paste at ({row}, {col}): header row and label column are not paste targets")]
    InvalidTarget { row: usize, col: usize },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Job service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Malformed result entry: {0}")]
    Decode(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SheetResult<T> = Result<T, SheetError>;
