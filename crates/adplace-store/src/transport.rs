//! Statement execution seam
//!
//! Repository functions are written against `Transport` so they run the same
//! on a bare connection (migrations, tests) and inside a `Session`, which adds
//! the cancellation/deadline check before each statement. A statement already
//! running is stopped by the session's progress handler instead.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

use crate::errors::{from_rusqlite, Result};
use crate::session::Session;

pub trait Transport {
    /// Run a statement that returns no rows; yields the affected row count
    ///
    /// # Errors
    ///
    /// `QueryBuild` on a parameter binding mismatch, `Storage` otherwise.
    fn execute(&self, op: &str, sql: &str, params: &[Value]) -> Result<usize>;

    /// Run a query and map every row
    ///
    /// # Errors
    ///
    /// `QueryBuild` on a parameter binding mismatch, `Storage` otherwise,
    /// including a row that fails to map.
    fn query<T, F>(&self, op: &str, sql: &str, params: &[Value], map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>;
}

impl Transport for Connection {
    fn execute(&self, op: &str, sql: &str, params: &[Value]) -> Result<usize> {
        let mut stmt = self
            .prepare_cached(sql)
            .map_err(|e| from_rusqlite(op, e))?;
        stmt.execute(params_from_iter(params.iter()))
            .map_err(|e| from_rusqlite(op, e))
    }

    fn query<T, F>(&self, op: &str, sql: &str, params: &[Value], map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self
            .prepare_cached(sql)
            .map_err(|e| from_rusqlite(op, e))?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), map)
            .map_err(|e| from_rusqlite(op, e))?;
        rows.collect::<rusqlite::Result<Vec<T>>>()
            .map_err(|e| from_rusqlite(op, e))
    }
}

impl Transport for Session {
    fn execute(&self, op: &str, sql: &str, params: &[Value]) -> Result<usize> {
        self.ctx().check(op)?;
        Transport::execute(&**self, op, sql, params)
    }

    fn query<T, F>(&self, op: &str, sql: &str, params: &[Value], map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.ctx().check(op)?;
        Transport::query(&**self, op, sql, params, map)
    }
}
