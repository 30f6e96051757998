//! Spreadsheet domain logic for the autofill client.
//!
//! Everything in this crate is synchronous and free of I/O: the grid
//! store, the tabular codec (delimited text, CSV, clipboard paste, JSON
//! export), job result decoding, batch bookkeeping, and the merge step
//! that writes decoded results back into the grid.

pub mod batch;
pub mod codec;
pub mod error;
pub mod grid;
pub mod merge;
pub mod result;
pub mod types;

pub use batch::{Batch, BatchProgress, SubmissionMode};
pub use error::{SheetError, SheetResult};
pub use grid::{GridSize, GridStore};
pub use merge::{merge_results, MergeReport};
pub use result::{decode_entry, decode_results, DecodedResults, JobResult};
pub use types::{BatchId, CellCoord, Timestamp};
