//! On-disk grid stored as a `cells(row, col, value)` table.
//!
//! Only non-empty cells are stored; writing an empty string deletes the cell.

use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{check_address, pad_rows, trim_trailing_empty, SheetBackend, SheetError};

const SCHEMA_VERSION: i64 = 1;

pub struct SqliteSheet {
    conn: Mutex<Connection>,
}

impl SqliteSheet {
    /// Open or create a workbook file.
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a workbook that must already exist.
    pub fn open_existing(path: &Path) -> Result<Self, SheetError> {
        if !path.exists() {
            return Err(SheetError::WorkbookNotFound(path.to_path_buf()));
        }
        Self::open(path)
    }

    pub fn open_in_memory() -> Result<Self, SheetError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, SheetError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cells (
                row INTEGER NOT NULL,
                col INTEGER NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (row, col)
             );
             CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
             );",
        )?;

        let version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if version.is_none() {
            conn.execute(
                "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn write_cell(
        conn: &Connection,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), SheetError> {
        if value.is_empty() {
            conn.execute(
                "DELETE FROM cells WHERE row = ?1 AND col = ?2",
                params![row as i64, col as i64],
            )?;
        } else {
            conn.execute(
                "INSERT INTO cells (row, col, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(row, col) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![row as i64, col as i64, value, Utc::now().to_rfc3339()],
            )?;
        }
        Ok(())
    }

    fn last_used_row(conn: &Connection) -> Result<usize, SheetError> {
        let max: Option<i64> = conn.query_row("SELECT MAX(row) FROM cells", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0) as usize)
    }
}

impl SheetBackend for SqliteSheet {
    fn get_all_values(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT row, col, value FROM cells ORDER BY row, col")?;
        let cells = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)? as usize,
                    row.get::<_, i64>(1)? as usize,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (r, c, value) in cells {
            if rows.len() < r {
                rows.resize(r, Vec::new());
            }
            let target = &mut rows[r - 1];
            if target.len() < c {
                target.resize(c, String::new());
            }
            target[c - 1] = value;
        }
        Ok(pad_rows(rows))
    }

    fn row_values(&self, row: usize) -> Result<Vec<String>, SheetError> {
        check_address(row, 1)?;
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT col, value FROM cells WHERE row = ?1 ORDER BY col")?;
        let cells = stmt
            .query_map([row as i64], |r| {
                Ok((r.get::<_, i64>(0)? as usize, r.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut values = Vec::new();
        for (c, value) in cells {
            if values.len() < c {
                values.resize(c, String::new());
            }
            values[c - 1] = value;
        }
        Ok(trim_trailing_empty(values))
    }

    fn cell_value(&self, row: usize, col: usize) -> Result<String, SheetError> {
        check_address(row, col)?;
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM cells WHERE row = ?1 AND col = ?2",
                params![row as i64, col as i64],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok(value.unwrap_or_default())
    }

    fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), SheetError> {
        check_address(row, col)?;
        let conn = self.conn.lock();
        Self::write_cell(&conn, row, col, value)
    }

    fn update_row(&self, row: usize, values: &[String]) -> Result<(), SheetError> {
        check_address(row, 1)?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for (i, value) in values.iter().enumerate() {
            Self::write_cell(&tx, row, i + 1, value)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn append_row(&self, values: &[String]) -> Result<usize, SheetError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let row = Self::last_used_row(&tx)? + 1;
        for (i, value) in values.iter().enumerate() {
            Self::write_cell(&tx, row, i + 1, value)?;
        }
        tx.commit()?;
        Ok(row)
    }
}
