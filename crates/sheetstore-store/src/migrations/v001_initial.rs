//! v001 -- Initial schema creation.
//!
//! Creates the three tables: `cells`, `column_names` and `images`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Cells
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS cells (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    tab_id     INTEGER NOT NULL,
    row_index  INTEGER NOT NULL,
    col_index  INTEGER NOT NULL,
    content    TEXT NOT NULL DEFAULT '',
    header     TEXT DEFAULT '',
    updated_at TEXT NOT NULL,                 -- ISO-8601 / RFC-3339

    UNIQUE (tab_id, row_index, col_index)
);

-- ----------------------------------------------------------------
-- Column names (one per tab/column)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS column_names (
    tab_id     INTEGER NOT NULL,
    col_index  INTEGER NOT NULL,
    name       TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    PRIMARY KEY (tab_id, col_index)
);

-- ----------------------------------------------------------------
-- Images (base64 payload kept inline in file_url)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS images (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name  TEXT NOT NULL,
    file_url   TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_images_created_at ON images(created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
