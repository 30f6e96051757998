use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use smartsheet_engine::Session;

/// `smartspreadsheet_<unix millis>.csv` in the working directory.
pub fn default_csv_path(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("smartspreadsheet_{}.csv", now.timestamp_millis()))
}

pub async fn write_csv(session: &Session, path: &Path) -> anyhow::Result<()> {
    let csv = session.export_csv()?;
    tokio::fs::write(path, csv)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "Results exported");
    Ok(())
}

/// Write the batch results as JSON. Skipped with a warning when nothing
/// was ever submitted.
pub async fn write_results_json(session: &Session, path: &Path) -> anyhow::Result<()> {
    let Some(json) = session.export_results_json()? else {
        tracing::warn!(path = %path.display(), "No batch results to export");
        return Ok(());
    };
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "Batch results exported");
    Ok(())
}
