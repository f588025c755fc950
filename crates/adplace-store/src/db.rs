//! Database connection settings
//!
//! The pool opens connections through r2d2; this module holds what every
//! connection gets on open, plus a throwaway in-memory opener for tests.

use rusqlite::Connection;
use std::time::Duration;

use crate::errors::{from_rusqlite, Result};

/// Open an in-memory SQLite database (for testing)
///
/// Each in-memory connection is its own database, so this is only useful
/// with a single connection, never behind the pool.
///
/// # Errors
///
/// Storage error when SQLite cannot allocate the database.
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(|e| from_rusqlite("db_open", e))
}

/// Apply per-connection settings; runs as the pool's connection init hook
///
/// WAL lets readers proceed while a writer holds the lock; the busy timeout
/// turns lock contention into a bounded wait instead of an immediate error.
///
/// # Errors
///
/// The raw rusqlite error, which r2d2 reports as a failed connect.
pub fn configure(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;

    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "sqlite connection configured");

    Ok(())
}
