//! Request and response types for the job service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smartsheet_core::{BatchId, SubmissionMode};

/// A batch submission as sent to the job service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRequest {
    /// One job per (row label, column label) pair.
    Labels { rows: Vec<String>, cols: Vec<String> },
    /// A whole table under a client-generated sheet id.
    Table {
        sheet_id: BatchId,
        table: Vec<Vec<String>>,
    },
}

impl SubmitRequest {
    pub fn mode(&self) -> SubmissionMode {
        match self {
            Self::Labels { .. } => SubmissionMode::Labels,
            Self::Table { .. } => SubmissionMode::Table,
        }
    }
}

/// What the job service accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAccepted {
    pub batch_id: BatchId,
    pub job_count: usize,
}

/// Body of `POST /api/v1/autofill`.
#[derive(Debug, Serialize)]
pub(crate) struct AutofillBody<'a> {
    pub rows: &'a [String],
    pub cols: &'a [String],
}

/// Body of `POST /api/v1/sheets/{sheetId}/run`.
#[derive(Debug, Serialize)]
pub(crate) struct SheetRunBody<'a> {
    pub table: &'a [Vec<String>],
}

/// Response to either submit endpoint (HTTP 202).
///
/// Label submissions answer with `autofillId`, table submissions with
/// `sheetId`; some deployments use `jobId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    #[serde(alias = "autofillId", alias = "sheetId", alias = "jobId")]
    pub id: Option<String>,
    pub job_count: usize,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to either status endpoint.
///
/// Values are JSON-encoded result strings or result objects; they are
/// decoded by [`smartsheet_core::decode_results`].
#[derive(Debug, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub results: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}
