//! Tabular text codec.
//!
//! - [`parse_delimited`]: raw, quote-unaware split of delimited text.
//! - [`import_csv`]: quote-aware CSV reader for files.
//! - [`encode_csv`]: CSV export with every field quoted.
//! - [`paste_ingest`]: tab-separated clipboard paste at an anchor cell.
//! - [`load_matrix`]: place a parsed matrix at the grid origin.
//! - [`export_results_json`]: pretty JSON dump of a batch's results.
//!
//! Paste ingestion is deliberately not quote-aware: clipboard data from
//! spreadsheets is tab-separated, and a quoted CSV pasted as text is
//! taken literally. Use [`import_csv`] to round-trip cells containing
//! commas, quotes, or line breaks.

use crate::batch::Batch;
use crate::error::{SheetError, SheetResult};
use crate::grid::GridStore;

/// Split `text` into lines and fields.
///
/// `\r\n` is normalized to `\n`, trailing blank lines are dropped, and
/// each field is trimmed. Rows may differ in length.
pub fn parse_delimited(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let normalized = text.replace("\r\n", "\n");
    let mut lines: Vec<&str> = normalized.split('\n').collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    lines
        .into_iter()
        .map(|line| {
            line.split(delimiter)
                .map(|field| field.trim().to_string())
                .collect()
        })
        .collect()
}

/// Read CSV text with full quoting rules. Rows may differ in length.
pub fn import_csv(text: &str) -> SheetResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|record| {
            let record = record?;
            Ok(record.iter().map(str::to_string).collect())
        })
        .collect()
}

/// Serialize the whole grid as CSV: every field quoted (embedded quotes
/// doubled), comma-delimited, `\n` after every row.
pub fn encode_csv(grid: &GridStore) -> SheetResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    for row in grid.iter_rows() {
        writer.write_record(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;

    let bytes = writer
        .into_inner()
        .map_err(|e| SheetError::Validation(format!("CSV buffer flush failed: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| SheetError::Validation(format!("CSV output is not UTF-8: {e}")))
}

/// Rectangle written by a paste.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteArea {
    pub start_row: usize,
    pub start_col: usize,
    /// Number of pasted lines.
    pub rows: usize,
    /// Widest pasted line, in fields.
    pub cols: usize,
}

/// Paste tab-separated `text` with its top-left field at
/// `(start_row, start_col)`, growing the grid to fit.
///
/// Cells outside the pasted rectangle are untouched; short lines leave
/// the rest of their row untouched too. Fields are written verbatim.
pub fn paste_ingest(
    grid: &mut GridStore,
    start_row: usize,
    start_col: usize,
    text: &str,
) -> SheetResult<PasteArea> {
    if start_row < 1 || start_col < 1 {
        return Err(SheetError::InvalidTarget {
            row: start_row,
            col: start_col,
        });
    }

    let normalized = text.replace('\r', "");
    let mut lines: Vec<&str> = normalized.split('\n').collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let data: Vec<Vec<&str>> = lines.iter().map(|line| line.split('\t').collect()).collect();
    let width = data.iter().map(Vec::len).max().unwrap_or(0);
    let area = PasteArea {
        start_row,
        start_col,
        rows: data.len(),
        cols: width,
    };
    if data.is_empty() {
        return Ok(area);
    }

    grid.resize_to_fit(start_row + data.len(), start_col + width);
    for (i, fields) in data.iter().enumerate() {
        for (j, field) in fields.iter().enumerate() {
            grid.set_cell(start_row + i, start_col + j, *field)?;
        }
    }

    tracing::debug!(
        start_row,
        start_col,
        rows = area.rows,
        cols = area.cols,
        "Pasted block into grid",
    );
    Ok(area)
}

/// Write `matrix` into the grid with its first field at `(0, 0)`,
/// growing the grid to fit. Header row and label column are included.
pub fn load_matrix(grid: &mut GridStore, matrix: &[Vec<String>]) -> SheetResult<()> {
    let width = matrix.iter().map(Vec::len).max().unwrap_or(0);
    grid.resize_to_fit(matrix.len(), width);

    for (r, row) in matrix.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            grid.set_cell(r, c, value.as_str())?;
        }
    }
    Ok(())
}

/// Pretty-printed JSON object of the batch's results keyed `"row:col"`.
pub fn export_results_json(batch: &Batch) -> SheetResult<String> {
    Ok(serde_json::to_string_pretty(batch.results())?)
}
