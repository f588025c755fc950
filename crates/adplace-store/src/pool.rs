//! Bounded SQLite connection pool
//!
//! r2d2 owns the connections and caps them at `max_connections`. On top of it
//! `AdConnectionManager` enforces the remaining bounds: a connection returned
//! while `max_idle` are already parked is closed, and one that sat idle past
//! `idle_timeout` or lived past `max_lifetime` is discarded at checkout.
//! `acquire` waits in short slices so a cancelled or expired `OpContext` is
//! noticed while the pool is exhausted.

use r2d2::{HandleError, ManageConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::StoreConfig;
use crate::context::OpContext;
use crate::db;
use crate::errors::{storage, Result};

/// Longest single wait on r2d2 before the context is looked at again
const ACQUIRE_SLICE: Duration = Duration::from_millis(10);

/// Reasons a connection is refused by the manager
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection idle for {0:?}, past the idle timeout")]
    IdleExpired(Duration),

    #[error("connection open for {0:?}, past its lifetime")]
    LifetimeExpired(Duration),
}

/// A SQLite connection plus the bookkeeping the idle and lifetime bounds need
pub struct AdConnection {
    conn: Connection,
    opened_at: Instant,
    returned_at: Option<Instant>,
    discard: bool,
}

pub struct AdConnectionManager {
    sqlite: SqliteConnectionManager,
    idle_timeout: Duration,
    max_lifetime: Duration,
}

impl AdConnectionManager {
    fn new(config: &StoreConfig) -> Self {
        let busy_timeout = config.busy_timeout();
        Self {
            sqlite: SqliteConnectionManager::file(&config.path)
                .with_init(move |conn| db::configure(conn, busy_timeout)),
            idle_timeout: config.idle_timeout(),
            max_lifetime: config.max_lifetime(),
        }
    }
}

impl ManageConnection for AdConnectionManager {
    type Connection = AdConnection;
    type Error = ConnectionError;

    fn connect(&self) -> std::result::Result<AdConnection, ConnectionError> {
        let conn = self.sqlite.connect()?;
        tracing::debug!("opened pooled connection");
        Ok(AdConnection {
            conn,
            opened_at: Instant::now(),
            returned_at: None,
            discard: false,
        })
    }

    fn is_valid(&self, conn: &mut AdConnection) -> std::result::Result<(), ConnectionError> {
        let age = conn.opened_at.elapsed();
        if age >= self.max_lifetime {
            return Err(ConnectionError::LifetimeExpired(age));
        }
        if let Some(idle) = conn.returned_at.map(|at| at.elapsed()) {
            if idle >= self.idle_timeout {
                return Err(ConnectionError::IdleExpired(idle));
            }
        }
        self.sqlite.is_valid(&mut conn.conn)?;
        Ok(())
    }

    fn has_broken(&self, conn: &mut AdConnection) -> bool {
        // Still inside a transaction means the rollback failed.
        conn.discard || !conn.conn.is_autocommit()
    }
}

/// Routes r2d2's background connection failures into tracing
#[derive(Debug)]
struct TracingErrorHandler;

impl HandleError<ConnectionError> for TracingErrorHandler {
    fn handle_error(&self, error: ConnectionError) {
        match error {
            ConnectionError::Sqlite(err) => {
                tracing::warn!(error = %err, "pooled connection failed");
            }
            stale => tracing::debug!(reason = %stale, "retired pooled connection"),
        }
    }
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub open: u32,
    pub idle: u32,
}

#[derive(Clone)]
pub struct ConnectionPool {
    pool: r2d2::Pool<AdConnectionManager>,
    config: Arc<StoreConfig>,
}

impl ConnectionPool {
    /// Create a pool; connections are opened lazily on first acquire
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(0))
            .idle_timeout(Some(config.idle_timeout()))
            .max_lifetime(Some(config.max_lifetime()))
            .connection_timeout(config.acquire_timeout())
            .error_handler(Box::new(TracingErrorHandler))
            .build_unchecked(AdConnectionManager::new(&config));
        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Check out a connection
    ///
    /// # Errors
    ///
    /// Storage error when the context is cancelled or expires, when the pool
    /// stays exhausted past the acquire timeout, or when no connection can be
    /// opened in that time.
    pub fn acquire(&self, ctx: &OpContext) -> Result<PooledConnection> {
        let timeout = ctx.clamp(self.config.acquire_timeout());
        let wait_until = Instant::now() + timeout;

        loop {
            ctx.check("pool_acquire")?;
            let slice = wait_until
                .saturating_duration_since(Instant::now())
                .min(ACQUIRE_SLICE);

            match self.pool.get_timeout(slice) {
                Ok(conn) => {
                    return Ok(PooledConnection {
                        conn,
                        pool: self.clone(),
                    })
                }
                Err(_) if Instant::now() < wait_until => continue,
                Err(err) => {
                    ctx.check("pool_acquire")?;
                    let status = self.status();
                    let reason = if status.open < self.config.max_connections {
                        format!("could not open a connection within {:?}: {}", timeout, err)
                    } else {
                        format!(
                            "connection pool exhausted ({} open) after {:?}",
                            status.open, timeout
                        )
                    };
                    return Err(storage("pool_acquire", reason));
                }
            }
        }
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.pool.state();
        PoolStatus {
            open: state.connections,
            idle: state.idle_connections,
        }
    }
}

/// A checked-out connection; returns itself to the pool on drop
pub struct PooledConnection {
    conn: r2d2::PooledConnection<AdConnectionManager>,
    pool: ConnectionPool,
}

impl PooledConnection {
    /// Close instead of recycling when dropped
    ///
    /// Used when the connection is left in an unknown transactional state.
    pub fn mark_broken(&mut self) {
        self.conn.discard = true;
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn.conn
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if self.pool.status().idle >= self.pool.config.max_idle {
            self.conn.discard = true;
        }
        self.conn.returned_at = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;
    use adplace_core::ExErrorKind;
    use tempfile::TempDir;

    fn pool(dir: &TempDir, max_connections: u32, max_idle: u32) -> ConnectionPool {
        ConnectionPool::new(StoreConfig {
            path: dir.path().join("pool.db"),
            max_connections,
            max_idle,
            acquire_timeout_ms: 50,
            ..StoreConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_connection_is_recycled() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir, 2, 2);

        drop(pool.acquire(&OpContext::background()).unwrap());
        assert_eq!(pool.status(), PoolStatus { open: 1, idle: 1 });

        let _conn = pool.acquire(&OpContext::background()).unwrap();
        assert_eq!(pool.status(), PoolStatus { open: 1, idle: 0 });
    }

    #[test]
    fn test_exhausted_pool_times_out() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir, 1, 1);
        let _held = pool.acquire(&OpContext::background()).unwrap();

        let started = Instant::now();
        let err = pool.acquire(&OpContext::background()).err().unwrap();
        assert_eq!(err.kind(), ExErrorKind::Storage);
        assert!(err.message().contains("exhausted"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_waiter_gets_released_connection() {
        let dir = TempDir::new().unwrap();
        let pool = ConnectionPool::new(StoreConfig {
            path: dir.path().join("pool.db"),
            max_connections: 1,
            max_idle: 1,
            acquire_timeout_ms: 2_000,
            ..StoreConfig::default()
        })
        .unwrap();
        let held = pool.acquire(&OpContext::background()).unwrap();

        let waiter = {
            let pool = pool.clone();
            std::thread::spawn(move || pool.acquire(&OpContext::background()).is_ok())
        };
        std::thread::sleep(Duration::from_millis(50));
        drop(held);

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_cancel_wakes_waiting_acquire() {
        let dir = TempDir::new().unwrap();
        let pool = ConnectionPool::new(StoreConfig {
            path: dir.path().join("pool.db"),
            max_connections: 1,
            max_idle: 1,
            acquire_timeout_ms: 3_000,
            ..StoreConfig::default()
        })
        .unwrap();
        let _held = pool.acquire(&OpContext::background()).unwrap();
        let token = CancelToken::new();

        let waiter = {
            let pool = pool.clone();
            let ctx = OpContext::background().with_cancel(token.clone());
            std::thread::spawn(move || {
                let started = Instant::now();
                let err = pool.acquire(&ctx).err().map(|e| e.message().to_string());
                (started.elapsed(), err)
            })
        };
        std::thread::sleep(Duration::from_millis(50));
        token.cancel();

        let (elapsed, err) = waiter.join().unwrap();
        assert!(err.unwrap().contains("cancelled"));
        assert!(elapsed < Duration::from_secs(1), "waited {:?}", elapsed);
    }

    #[test]
    fn test_deadline_cuts_acquire_wait_short() {
        let dir = TempDir::new().unwrap();
        let pool = ConnectionPool::new(StoreConfig {
            path: dir.path().join("pool.db"),
            max_connections: 1,
            max_idle: 1,
            acquire_timeout_ms: 3_000,
            ..StoreConfig::default()
        })
        .unwrap();
        let _held = pool.acquire(&OpContext::background()).unwrap();

        let started = Instant::now();
        let err = pool
            .acquire(&OpContext::with_timeout(Duration::from_millis(50)))
            .err()
            .unwrap();
        assert!(err.message().contains("deadline"));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_idle_beyond_limit_is_closed() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir, 3, 1);
        let a = pool.acquire(&OpContext::background()).unwrap();
        let b = pool.acquire(&OpContext::background()).unwrap();
        drop(a);
        drop(b);

        assert_eq!(pool.status(), PoolStatus { open: 1, idle: 1 });
    }

    #[test]
    fn test_stale_idle_connection_is_reaped() {
        let dir = TempDir::new().unwrap();
        let pool = ConnectionPool::new(StoreConfig {
            path: dir.path().join("pool.db"),
            max_connections: 2,
            max_idle: 2,
            idle_timeout_ms: 10,
            ..StoreConfig::default()
        })
        .unwrap();
        drop(pool.acquire(&OpContext::background()).unwrap());
        std::thread::sleep(Duration::from_millis(30));

        let _fresh = pool.acquire(&OpContext::background()).unwrap();
        assert_eq!(pool.status(), PoolStatus { open: 1, idle: 0 });
    }

    #[test]
    fn test_broken_connection_is_not_recycled() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir, 2, 2);
        let mut conn = pool.acquire(&OpContext::background()).unwrap();
        conn.mark_broken();
        drop(conn);

        assert_eq!(pool.status(), PoolStatus { open: 0, idle: 0 });
    }

    #[test]
    fn test_connection_left_in_transaction_is_not_recycled() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir, 2, 2);
        let conn = pool.acquire(&OpContext::background()).unwrap();
        conn.execute_batch("BEGIN").unwrap();
        drop(conn);

        assert_eq!(pool.status(), PoolStatus { open: 0, idle: 0 });
    }

    #[test]
    fn test_cancelled_context_fails_before_acquire() {
        let dir = TempDir::new().unwrap();
        let pool = pool(&dir, 1, 1);
        let token = CancelToken::new();
        token.cancel();

        let err = pool
            .acquire(&OpContext::background().with_cancel(token))
            .err()
            .unwrap();
        assert!(err.message().contains("cancelled"));
        assert_eq!(pool.status().open, 0);
    }
}
