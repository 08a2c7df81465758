//! CRUD operations for [`Cell`] records, including the full-sync replace.

use chrono::Utc;
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::{Cell, ColumnName, NewCell, SyncSummary};

const UPSERT_CELL_SQL: &str = "INSERT INTO cells (tab_id, row_index, col_index, content, header, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT (tab_id, row_index, col_index)
     DO UPDATE SET content = excluded.content,
                   header = excluded.header,
                   updated_at = excluded.updated_at";

const UPSERT_COLUMN_SQL: &str = "INSERT INTO column_names (tab_id, col_index, name, updated_at)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (tab_id, col_index)
     DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// List the cells of one tab, or of every tab when `tab_id` is `None`.
    pub fn list_cells(&self, tab_id: Option<i64>) -> Result<Vec<Cell>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, tab_id, row_index, col_index, content, COALESCE(header, '')
             FROM cells
             WHERE ?1 IS NULL OR tab_id = ?1
             ORDER BY tab_id, row_index, col_index",
        )?;

        let rows = stmt.query_map(params![tab_id], row_to_cell)?;

        let mut cells = Vec::new();
        for row in rows {
            cells.push(row?);
        }
        Ok(cells)
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Insert a cell, or overwrite content and header of the cell already at
    /// the same coordinates. Returns the stored row.
    pub fn upsert_cell(&self, cell: &NewCell) -> Result<Cell> {
        let now = Utc::now().to_rfc3339();

        let stored = self.conn().query_row(
            &format!(
                "{UPSERT_CELL_SQL}
                 RETURNING id, tab_id, row_index, col_index, content, COALESCE(header, '')"
            ),
            params![
                cell.tab_id,
                cell.row_index,
                cell.col_index,
                cell.content,
                cell.header,
                now,
            ],
            row_to_cell,
        )?;

        Ok(stored)
    }

    /// Replace every cell and column name with the given snapshot.
    ///
    /// Both tables are emptied, then the non-empty cells and all column names
    /// are inserted. The whole replace runs in one transaction; on error
    /// nothing changes.
    pub fn replace_all(&mut self, cells: &[NewCell], columns: &[ColumnName]) -> Result<SyncSummary> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn_mut().transaction()?;

        let cleared_cells = tx.execute("DELETE FROM cells", [])?;
        let cleared_columns = tx.execute("DELETE FROM column_names", [])?;

        {
            let mut insert_cell = tx.prepare(UPSERT_CELL_SQL)?;
            for cell in cells.iter().filter(|c| !c.content.is_empty()) {
                insert_cell.execute(params![
                    cell.tab_id,
                    cell.row_index,
                    cell.col_index,
                    cell.content,
                    cell.header,
                    now,
                ])?;
            }

            let mut insert_column = tx.prepare(UPSERT_COLUMN_SQL)?;
            for column in columns {
                insert_column.execute(params![column.tab_id, column.col_index, column.name, now])?;
            }
        }

        // rows stored, so repeated coordinates count once
        let summary = SyncSummary {
            cells_saved: tx.query_row("SELECT COUNT(*) FROM cells", [], |row| row.get(0))?,
            columns_saved: tx.query_row("SELECT COUNT(*) FROM column_names", [], |row| row.get(0))?,
        };

        tx.commit()?;

        tracing::debug!(
            cleared_cells,
            cleared_columns,
            cells_saved = summary.cells_saved,
            columns_saved = summary.columns_saved,
            "replaced sheet contents"
        );

        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Cell`].
fn row_to_cell(row: &rusqlite::Row<'_>) -> rusqlite::Result<Cell> {
    Ok(Cell {
        id: row.get(0)?,
        tab_id: row.get(1)?,
        row_index: row.get(2)?,
        col_index: row.get(3)?,
        content: row.get(4)?,
        header: row.get(5)?,
    })
}
