//! One sheet and the orchestrator that fills it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use smartsheet_client::{JobService, JobServiceApi, SubmitRequest};
use smartsheet_core::codec::{encode_csv, import_csv, load_matrix, paste_ingest, PasteArea};
use smartsheet_core::{BatchId, GridStore, SheetResult};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::orchestrator::{JobOrchestrator, SharedGrid};

/// Owns one grid and one orchestrator writing into it.
///
/// Every grid operation goes through the session; the orchestrator only
/// touches the grid while merging a poll response.
#[derive(Clone)]
pub struct Session {
    grid: SharedGrid,
    orchestrator: JobOrchestrator,
    service: Arc<dyn JobService>,
}

impl Session {
    pub fn new(service: Arc<dyn JobService>, grid: GridStore, poll_interval: Duration) -> Self {
        let grid: SharedGrid = Arc::new(Mutex::new(grid));
        let orchestrator = JobOrchestrator::new(Arc::clone(&service), Arc::clone(&grid), poll_interval);
        Self {
            grid,
            orchestrator,
            service,
        }
    }

    /// Build a session against the HTTP job service named in `config`.
    pub fn connect(config: &EngineConfig) -> Result<Self, EngineError> {
        let api = JobServiceApi::with_timeout(&config.job_service_url, config.request_timeout)?;
        Ok(Self::new(
            Arc::new(api),
            GridStore::with_size(config.grid_size),
            config.poll_interval,
        ))
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        &self.orchestrator
    }

    /// Lock the grid for reading or editing. Do not hold the guard across
    /// an `.await`.
    pub fn grid(&self) -> MutexGuard<'_, GridStore> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Probe the job service once and log the outcome.
    pub async fn check_health(&self) -> bool {
        match self.service.health().await {
            Ok(payload) => {
                tracing::info!(%payload, "Job service is healthy");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Job service not available");
                false
            }
        }
    }

    /// Submit one job per (row label, column label) pair read from the
    /// label column and header row.
    pub async fn submit_labels(&self) -> Result<BatchId, EngineError> {
        let (rows, cols) = {
            let grid = self.grid();
            (grid.row_labels(), grid.column_labels())
        };
        tracing::debug!(rows = rows.len(), cols = cols.len(), "Submitting label batch");
        self.orchestrator
            .submit(SubmitRequest::Labels { rows, cols })
            .await
    }

    /// Submit the populated part of the grid as a table under a fresh
    /// sheet id.
    pub async fn submit_table(&self) -> Result<BatchId, EngineError> {
        let table = table_payload(&self.grid());
        let sheet_id = BatchId::generate();
        tracing::debug!(sheet_id = %sheet_id, rows = table.len(), "Submitting table batch");
        self.orchestrator
            .submit(SubmitRequest::Table { sheet_id, table })
            .await
    }

    pub fn stop(&self) {
        self.orchestrator.stop();
    }

    pub fn paste(&self, start_row: usize, start_col: usize, text: &str) -> SheetResult<PasteArea> {
        paste_ingest(&mut self.grid(), start_row, start_col, text)
    }

    /// Load CSV text into the grid with its first record as the header row.
    pub fn load_csv(&self, text: &str) -> SheetResult<()> {
        let matrix = import_csv(text)?;
        load_matrix(&mut self.grid(), &matrix)
    }

    pub fn export_csv(&self) -> SheetResult<String> {
        encode_csv(&self.grid())
    }

    pub fn export_results_json(&self) -> SheetResult<Option<String>> {
        self.orchestrator.export_results_json()
    }

    /// Reset the grid to its default dimensions. A running batch keeps
    /// polling; results that no longer fit are dropped.
    pub fn clear(&self) {
        self.grid().clear();
    }
}

/// Grid contents without trailing blank rows and columns. The header row
/// is always kept.
fn table_payload(grid: &GridStore) -> Vec<Vec<String>> {
    let is_blank = |cell: &String| cell.trim().is_empty();

    let mut matrix = grid.to_matrix();
    while matrix.len() > 1 && matrix.last().is_some_and(|row| row.iter().all(is_blank)) {
        matrix.pop();
    }

    let width = matrix
        .iter()
        .map(|row| row.iter().rposition(|cell| !is_blank(cell)).map_or(0, |i| i + 1))
        .max()
        .unwrap_or(0)
        .max(1);
    for row in &mut matrix {
        row.truncate(width);
    }
    matrix
}
