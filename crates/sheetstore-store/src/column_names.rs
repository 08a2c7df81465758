//! Read access to the per-tab column name table. Writes happen only through
//! [`Database::replace_all`].

use crate::database::Database;
use crate::error::Result;
use crate::models::{group_column_names, ColumnName, ColumnNameMap};

impl Database {
    /// All column names ordered by tab, then column.
    pub fn list_column_names(&self) -> Result<Vec<ColumnName>> {
        let mut stmt = self.conn().prepare(
            "SELECT tab_id, col_index, name
             FROM column_names
             ORDER BY tab_id, col_index",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ColumnName {
                tab_id: row.get(0)?,
                col_index: row.get(1)?,
                name: row.get(2)?,
            })
        })?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// Column names grouped as `tab_id -> col_index -> name`.
    pub fn column_name_map(&self) -> Result<ColumnNameMap> {
        Ok(group_column_names(self.list_column_names()?))
    }
}
