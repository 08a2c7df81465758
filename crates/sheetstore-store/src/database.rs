//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. A handle is opened for one
//! request and closed when it is dropped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Busy timeout used when the caller does not pick one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database named by a connection URL.
    ///
    /// Accepted forms: `sqlite://<path>`, `sqlite:<path>`, `file:<path>`
    /// or a bare filesystem path. The parent directory must already exist.
    pub fn connect(url: &str, busy_timeout: Duration) -> Result<Self> {
        let path = resolve_url(url)?;
        tracing::debug!(path = %path.display(), "opening database");
        Self::open_with_timeout(&path, busy_timeout)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::prepare(conn, DEFAULT_BUSY_TIMEOUT)
    }

    fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::prepare(conn, busy_timeout)
    }

    fn prepare(conn: Connection, busy_timeout: Duration) -> Result<Self> {
        conn.busy_timeout(busy_timeout)?;

        // journal_mode answers with the mode actually set
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return a mutable reference to the underlying connection.
    ///
    /// Needed to open a transaction.
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}

/// Turn a configured database URL into a filesystem path.
pub fn resolve_url(url: &str) -> Result<PathBuf> {
    let trimmed = url.trim();
    let raw = ["sqlite://", "sqlite:", "file:"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);

    // drop any `?mode=...` style options
    let raw = raw.split('?').next().unwrap_or_default();

    if raw.is_empty() {
        return Err(StoreError::InvalidUrl(url.to_string()));
    }
    if raw == ":memory:" {
        // a fresh in-memory database per request would never see earlier writes
        return Err(StoreError::InvalidUrl(
            "in-memory databases cannot be shared between requests".to_string(),
        ));
    }

    Ok(PathBuf::from(raw))
}
