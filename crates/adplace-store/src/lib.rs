//! AdPlace Store - SQLite persistence for advertisements
//!
//! Provides:
//! - Store configuration with pool bounds and timeouts
//! - A bounded connection pool and serializable transactional sessions
//! - Cancellation/deadline context threaded into every transport call
//! - Embedded SQL migrations with checksums
//! - Insert, dynamic-filter selection and partial update of advertisements
//! - `AdStore`, a facade that opens one session per operation

pub mod ad_store;
pub mod config;
pub mod context;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod pool;
pub mod repo;
pub mod session;
pub mod transport;

// Re-export key types
pub use ad_store::AdStore;
pub use config::StoreConfig;
pub use context::{CancelToken, OpContext};
pub use errors::Result;
pub use pool::{ConnectionPool, PoolStatus, PooledConnection};
pub use session::{Session, SessionMode};
pub use transport::Transport;
