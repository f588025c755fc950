//! Transactional sessions
//!
//! A session owns one pooled connection and one open transaction for the
//! duration of a unit of work. SQLite transactions are serializable, so a
//! session observes a consistent snapshot and its writes become visible to
//! others only on commit. Dropping a session without committing rolls back.
//!
//! While a session is open, SQLite's progress handler polls its `OpContext`;
//! cancelling the token or passing the deadline interrupts the statement that
//! is running, which surfaces as a storage error.

use std::ops::Deref;

use rusqlite::Connection;

use crate::context::OpContext;
use crate::errors::{from_rusqlite, Result};
use crate::pool::{ConnectionPool, PooledConnection};

/// SQLite VM instructions between context polls
const PROGRESS_OPS: i32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Deferred transaction; takes a shared lock on first read
    ReadOnly,
    /// Immediate transaction; takes the write lock up front so later writes
    /// cannot fail with a lock upgrade conflict
    ReadWrite,
}

impl SessionMode {
    fn begin_sql(self) -> &'static str {
        match self {
            SessionMode::ReadOnly => "BEGIN DEFERRED",
            SessionMode::ReadWrite => "BEGIN IMMEDIATE",
        }
    }
}

pub struct Session {
    conn: PooledConnection,
    ctx: OpContext,
    mode: SessionMode,
    finished: bool,
}

impl Session {
    /// Check out a connection and open a transaction on it
    ///
    /// # Errors
    ///
    /// Storage error when the pool cannot supply a connection in time, the
    /// context has expired, or the database lock cannot be taken.
    pub fn begin(pool: &ConnectionPool, ctx: &OpContext, mode: SessionMode) -> Result<Self> {
        let conn = pool.acquire(ctx)?;
        ctx.check("session_begin")?;

        conn.busy_timeout(ctx.clamp(pool.config().busy_timeout()))
            .map_err(|e| from_rusqlite("session_begin", e))?;
        conn.execute_batch(mode.begin_sql())
            .map_err(|e| from_rusqlite("session_begin", e))?;

        let watched = ctx.clone();
        conn.progress_handler(PROGRESS_OPS, Some(move || watched.is_done()));

        tracing::debug!(mode = ?mode, "session started");
        Ok(Self {
            conn,
            ctx: ctx.clone(),
            mode,
            finished: false,
        })
    }

    pub fn ctx(&self) -> &OpContext {
        &self.ctx
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Make every write in this session durable and visible
    ///
    /// # Errors
    ///
    /// Storage error when the commit fails; the transaction is then rolled
    /// back when the session drops.
    pub fn commit(mut self) -> Result<()> {
        self.stop_watching();
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| from_rusqlite("session_commit", e))?;
        self.finished = true;
        tracing::debug!("session committed");
        Ok(())
    }

    /// Discard every write in this session
    ///
    /// # Errors
    ///
    /// Storage error when SQLite refuses the rollback.
    pub fn rollback(mut self) -> Result<()> {
        self.stop_watching();
        self.finished = true;
        let result = self
            .conn
            .execute_batch("ROLLBACK")
            .map_err(|e| from_rusqlite("session_rollback", e));
        if result.is_err() {
            self.conn.mark_broken();
        }
        result
    }

    /// Detach the context from the connection before it goes back to the pool
    fn stop_watching(&self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
    }
}

impl Deref for Session {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_watching();
        if self.finished {
            return;
        }
        if self.conn.is_autocommit() {
            // An interrupted write already rolled the transaction back.
            tracing::debug!("session transaction already ended");
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            tracing::debug!(error = %err, "rollback on drop failed; discarding connection");
            self.conn.mark_broken();
        } else {
            tracing::debug!("uncommitted session rolled back");
        }
    }
}
