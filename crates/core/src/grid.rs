//! Rectangular cell store backing the sheet.
//!
//! Row 0 holds column attributes and column 0 holds row labels; every
//! other cell belongs to the data region. The store is always a full
//! rectangle: growth appends whole rows or whole columns, and every
//! in-bounds read succeeds.

use crate::error::{SheetError, SheetResult};

/// Default number of rows (header row + 100 data rows).
pub const DEFAULT_ROWS: usize = 101;

/// Default number of columns (label column + 10 attribute columns).
pub const DEFAULT_COLS: usize = 11;

/// Grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl GridSize {
    /// Validate that both dimensions are at least 1.
    pub fn new(rows: usize, cols: usize) -> SheetResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(SheetError::Validation(format!(
                "Grid must have at least one row and one column, got {rows}x{cols}"
            )));
        }
        Ok(Self { rows, cols })
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridStore {
    cells: Vec<Vec<String>>,
    cols: usize,
    /// Dimensions restored by [`clear`](Self::clear).
    reset_size: GridSize,
}

impl Default for GridStore {
    fn default() -> Self {
        Self::with_size(GridSize::default())
    }
}

impl GridStore {
    /// Create a `rows` x `cols` grid of empty cells.
    ///
    /// `clear()` on the returned grid restores the crate defaults
    /// ([`DEFAULT_ROWS`] x [`DEFAULT_COLS`]).
    pub fn create(rows: usize, cols: usize) -> SheetResult<Self> {
        let size = GridSize::new(rows, cols)?;
        Ok(Self {
            cells: blank_cells(size),
            cols: size.cols,
            reset_size: GridSize::default(),
        })
    }

    /// Create a grid whose initial and reset dimensions are both `size`.
    pub fn with_size(size: GridSize) -> Self {
        Self {
            cells: blank_cells(size),
            cols: size.cols,
            reset_size: size,
        }
    }

    /// Current row count, including the header row.
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// Current column count, including the label column.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Current dimensions.
    pub fn size(&self) -> GridSize {
        GridSize {
            rows: self.rows(),
            cols: self.cols,
        }
    }

    /// Append one blank row at the bottom.
    pub fn add_row(&mut self) {
        self.cells.push(vec![String::new(); self.cols]);
    }

    /// Append one blank column on the right of every row.
    pub fn add_column(&mut self) {
        for row in &mut self.cells {
            row.push(String::new());
        }
        self.cols += 1;
    }

    /// Discard all content and restore the reset dimensions.
    pub fn clear(&mut self) {
        self.cells = blank_cells(self.reset_size);
        self.cols = self.reset_size.cols;
    }

    /// Read a cell's text; empty cells read as `""`.
    ///
    /// Fails with [`SheetError::OutOfRange`] outside the current bounds.
    pub fn get_cell(&self, row: usize, col: usize) -> SheetResult<&str> {
        self.check_bounds(row, col)?;
        Ok(&self.cells[row][col])
    }

    /// Overwrite a cell. Callers must grow the grid first; writes past the
    /// current bounds fail with [`SheetError::OutOfRange`].
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> SheetResult<()> {
        self.check_bounds(row, col)?;
        self.cells[row][col] = value.into();
        Ok(())
    }

    /// Blank a cell without changing the grid size.
    pub fn clear_cell(&mut self, row: usize, col: usize) -> SheetResult<()> {
        self.set_cell(row, col, String::new())
    }

    /// Grow until the grid is at least `rows` x `cols`.
    ///
    /// Never shrinks, and existing content keeps its coordinates.
    pub fn resize_to_fit(&mut self, rows: usize, cols: usize) {
        while self.rows() < rows {
            self.add_row();
        }
        while self.cols < cols {
            self.add_column();
        }
    }

    /// Row labels from column 0 (excluding the title cell), trimmed, with
    /// blank labels skipped.
    ///
    /// Results come back indexed by position in this list, so a blank label
    /// between two filled ones shifts every later result up one row.
    pub fn row_labels(&self) -> Vec<String> {
        self.cells
            .iter()
            .skip(1)
            .filter_map(|row| non_blank(&row[0]))
            .collect()
    }

    /// Column attributes from row 0 (excluding the title cell), trimmed,
    /// with blank attributes skipped.
    pub fn column_labels(&self) -> Vec<String> {
        self.cells[0].iter().skip(1).filter_map(|c| non_blank(c)).collect()
    }

    /// Iterate over whole rows, header row first.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[String]> {
        self.cells.iter().map(Vec::as_slice)
    }

    /// Copy the grid out as a row-major matrix.
    pub fn to_matrix(&self) -> Vec<Vec<String>> {
        self.cells.clone()
    }

    // ---- private helpers ----

    fn check_bounds(&self, row: usize, col: usize) -> SheetResult<()> {
        if row >= self.rows() || col >= self.cols {
            return Err(SheetError::OutOfRange {
                row,
                col,
                rows: self.rows(),
                cols: self.cols,
            });
        }
        Ok(())
    }
}

fn blank_cells(size: GridSize) -> Vec<Vec<String>> {
    vec![vec![String::new(); size.cols]; size.rows]
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
