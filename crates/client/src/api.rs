//! HTTP/JSON binding of [`JobService`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use smartsheet_core::{decode_results, BatchId, DecodedResults, SubmissionMode};

use crate::error::JobServiceError;
use crate::models::{
    AutofillBody, SheetRunBody, StatusResponse, SubmitAccepted, SubmitRequest, SubmitResponse,
};
use crate::service::JobService;

/// HTTP client for one job service deployment.
#[derive(Debug, Clone)]
pub struct JobServiceApi {
    client: reqwest::Client,
    base_url: String,
}

impl JobServiceApi {
    /// Create a client for the service at `base_url`, e.g.
    /// `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, JobServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/v1/autofill`.
    pub async fn submit_autofill(
        &self,
        rows: &[String],
        cols: &[String],
    ) -> Result<SubmitAccepted, JobServiceError> {
        let response = self
            .client
            .post(format!("{}/api/v1/autofill", self.base_url))
            .json(&AutofillBody { rows, cols })
            .send()
            .await?;

        let parsed: SubmitResponse = Self::parse_response(response).await?;
        let id = parsed.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            JobServiceError::InvalidResponse("autofill response carries no batch id".into())
        })?;

        Ok(SubmitAccepted {
            batch_id: BatchId::new(id),
            job_count: parsed.job_count,
        })
    }

    /// `POST /api/v1/sheets/{sheetId}/run`.
    ///
    /// The service may echo a different sheet id; when it echoes none the
    /// submitted one is kept.
    pub async fn submit_sheet(
        &self,
        sheet_id: &BatchId,
        table: &[Vec<String>],
    ) -> Result<SubmitAccepted, JobServiceError> {
        let response = self
            .client
            .post(format!("{}/api/v1/sheets/{}/run", self.base_url, sheet_id))
            .json(&SheetRunBody { table })
            .send()
            .await?;

        let parsed: SubmitResponse = Self::parse_response(response).await?;
        let batch_id = parsed
            .id
            .filter(|id| !id.is_empty())
            .map(BatchId::new)
            .unwrap_or_else(|| sheet_id.clone());

        Ok(SubmitAccepted {
            batch_id,
            job_count: parsed.job_count,
        })
    }

    /// `GET /api/v1/autofill/{id}/status` or `GET /api/v1/sheets/{id}/status`.
    pub async fn fetch_status(
        &self,
        batch_id: &BatchId,
        mode: SubmissionMode,
    ) -> Result<StatusResponse, JobServiceError> {
        let path = match mode {
            SubmissionMode::Labels => "autofill",
            SubmissionMode::Table => "sheets",
        };
        let response = self
            .client
            .get(format!("{}/api/v1/{}/{}/status", self.base_url, path, batch_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Return the response unchanged on a 2xx status, otherwise an
    /// [`JobServiceError::ApiError`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, JobServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(JobServiceError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, JobServiceError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl JobService for JobServiceApi {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitAccepted, JobServiceError> {
        let accepted = match request {
            SubmitRequest::Labels { rows, cols } => self.submit_autofill(rows, cols).await?,
            SubmitRequest::Table { sheet_id, table } => self.submit_sheet(sheet_id, table).await?,
        };
        tracing::info!(
            batch_id = %accepted.batch_id,
            job_count = accepted.job_count,
            mode = ?request.mode(),
            "Batch accepted by job service",
        );
        Ok(accepted)
    }

    async fn status(
        &self,
        batch_id: &BatchId,
        mode: SubmissionMode,
    ) -> Result<DecodedResults, JobServiceError> {
        let response = self.fetch_status(batch_id, mode).await?;
        if let Some(error) = response.error {
            return Err(JobServiceError::InvalidResponse(error));
        }
        Ok(decode_results(&response.results))
    }

    /// `GET /health`.
    async fn health(&self) -> Result<Value, JobServiceError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }
}
