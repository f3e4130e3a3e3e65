//! In-process grid. Used by tests and as a scratch workbook.

use parking_lot::RwLock;

use super::{check_address, pad_rows, trim_trailing_empty, SheetBackend, SheetError};

#[derive(Debug, Default)]
pub struct MemorySheet {
    rows: RwLock<Vec<Vec<String>>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the grid, row 1 first.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        Self {
            rows: RwLock::new(rows),
        }
    }

    fn last_used_row(rows: &[Vec<String>]) -> usize {
        rows.iter()
            .rposition(|r| r.iter().any(|c| !c.is_empty()))
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

impl SheetBackend for MemorySheet {
    fn get_all_values(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let rows = self.rows.read();
        let used = Self::last_used_row(&rows);
        Ok(pad_rows(rows[..used].to_vec()))
    }

    fn row_values(&self, row: usize) -> Result<Vec<String>, SheetError> {
        check_address(row, 1)?;
        let rows = self.rows.read();
        Ok(rows
            .get(row - 1)
            .map(|r| trim_trailing_empty(r.clone()))
            .unwrap_or_default())
    }

    fn cell_value(&self, row: usize, col: usize) -> Result<String, SheetError> {
        check_address(row, col)?;
        let rows = self.rows.read();
        Ok(rows
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .cloned()
            .unwrap_or_default())
    }

    fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), SheetError> {
        check_address(row, col)?;
        let mut rows = self.rows.write();
        if rows.len() < row {
            rows.resize(row, Vec::new());
        }
        let target = &mut rows[row - 1];
        if target.len() < col {
            target.resize(col, String::new());
        }
        target[col - 1] = value.to_string();
        Ok(())
    }

    fn update_row(&self, row: usize, values: &[String]) -> Result<(), SheetError> {
        for (i, value) in values.iter().enumerate() {
            self.update_cell(row, i + 1, value)?;
        }
        Ok(())
    }

    fn append_row(&self, values: &[String]) -> Result<usize, SheetError> {
        let row = {
            let rows = self.rows.read();
            Self::last_used_row(&rows) + 1
        };
        self.update_row(row, values)?;
        Ok(row)
    }
}
