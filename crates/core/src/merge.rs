//! Merge decoded job results into the batch and the grid.

use serde::Serialize;

use crate::batch::Batch;
use crate::grid::GridStore;
use crate::result::DecodedResults;

/// Outcome of one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Entries accepted into the batch; this is the completion count the
    /// poll reported.
    pub merged: usize,
    /// Grid cells whose text actually changed.
    pub written: usize,
    /// Entries whose grid position lies outside the current bounds.
    pub out_of_range: usize,
    /// Entries skipped during decoding.
    pub malformed: usize,
    /// Batch completion count after the merge.
    pub completed: usize,
}

/// Write every decoded entry into `batch` and, when its grid position
/// `(row + 1, col + 1)` is in bounds, into `grid`.
///
/// Out-of-range entries still count as completed jobs: the grid may have
/// been cleared while the batch was running, and the result stays
/// available in the batch for export. Re-merging identical entries
/// changes nothing.
pub fn merge_results(
    batch: &mut Batch,
    results: &DecodedResults,
    grid: &mut GridStore,
) -> MergeReport {
    let mut report = MergeReport {
        malformed: results.malformed,
        ..Default::default()
    };

    for (coord, result) in &results.entries {
        batch.record_result(*coord, result);
        report.merged += 1;

        let (row, col) = coord.to_grid();
        if row >= grid.rows() || col >= grid.cols() {
            tracing::debug!(
                batch_id = %batch.id(),
                key = %coord,
                rows = grid.rows(),
                cols = grid.cols(),
                "Dropping result outside the grid",
            );
            report.out_of_range += 1;
            continue;
        }

        let unchanged = grid
            .get_cell(row, col)
            .is_ok_and(|current| current == result.result);
        if !unchanged && grid.set_cell(row, col, result.result.clone()).is_ok() {
            report.written += 1;
        }
    }

    batch.record_completed(report.merged);
    report.completed = batch.completed();
    report
}
