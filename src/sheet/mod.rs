//! Row-oriented workbook used as the outreach datastore.
//!
//! A `SheetBackend` is a plain grid of string cells addressed with 1-indexed
//! rows and columns, the same addressing a hosted spreadsheet uses. The
//! `CompanyTracker` layers the company/person schema on top of any backend.
//!
//! Modules:
//! - cell: hyperlink payloads and `Person N` header labels
//! - memory: in-process grid
//! - sqlite: on-disk grid in a single SQLite file
//! - tracker: company rows, status writes, person column allocation

pub mod cell;
pub mod memory;
pub mod sqlite;
pub mod tracker;

use std::path::PathBuf;

pub use memory::MemorySheet;
pub use sqlite::SqliteSheet;
pub use tracker::CompanyTracker;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Workbook not found at {0}")]
    WorkbookNotFound(PathBuf),
    #[error("Invalid cell address row {row}, col {col}")]
    InvalidAddress { row: usize, col: usize },
    #[error("Company {0} not found")]
    CompanyNotFound(String),
    #[error("Company {0} already exists")]
    DuplicateCompany(String),
    #[error("No person column after Person {0}")]
    PersonColumnsExhausted(u32),
}

/// A grid of string cells. Rows and columns start at 1.
///
/// Missing cells read as empty strings. Implementations must be safe to
/// share between tasks; writes are visible to the next read.
pub trait SheetBackend: Send + Sync {
    /// Every row up to the last non-empty one, each padded to the widest row.
    fn get_all_values(&self) -> Result<Vec<Vec<String>>, SheetError>;

    /// One row with trailing empty cells trimmed.
    fn row_values(&self, row: usize) -> Result<Vec<String>, SheetError>;

    fn cell_value(&self, row: usize, col: usize) -> Result<String, SheetError>;

    fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), SheetError>;

    /// Write `values` into `row` starting at column 1.
    fn update_row(&self, row: usize, values: &[String]) -> Result<(), SheetError>;

    /// Write `values` into the first row after the last non-empty row.
    /// Returns the row number written.
    fn append_row(&self, values: &[String]) -> Result<usize, SheetError>;
}

pub(crate) fn check_address(row: usize, col: usize) -> Result<(), SheetError> {
    if row == 0 || col == 0 {
        return Err(SheetError::InvalidAddress { row, col });
    }
    Ok(())
}

/// Pad rows to a common width so column indexes line up with the header.
pub(crate) fn pad_rows(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }
    rows
}

pub(crate) fn trim_trailing_empty(mut row: Vec<String>) -> Vec<String> {
    while row.last().is_some_and(|c| c.is_empty()) {
        row.pop();
    }
    row
}
