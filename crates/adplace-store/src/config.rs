//! Store configuration
//!
//! Defaults mirror the reference deployment: 20 idle connections, a 1 second
//! idle timeout and a 30 second connection lifetime.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{storage, Result};

pub const ENV_DB_PATH: &str = "ADPLACE_DB_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "ADPLACE_DB_MAX_CONNECTIONS";
pub const ENV_MAX_IDLE: &str = "ADPLACE_DB_MAX_IDLE";
pub const ENV_IDLE_TIMEOUT_MS: &str = "ADPLACE_DB_IDLE_TIMEOUT_MS";
pub const ENV_MAX_LIFETIME_MS: &str = "ADPLACE_DB_MAX_LIFETIME_MS";
pub const ENV_ACQUIRE_TIMEOUT_MS: &str = "ADPLACE_DB_ACQUIRE_TIMEOUT_MS";
pub const ENV_BUSY_TIMEOUT_MS: &str = "ADPLACE_DB_BUSY_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file
    pub path: PathBuf,
    /// Hard cap on open connections (idle + checked out)
    pub max_connections: u32,
    /// Connections kept around when returned to the pool
    pub max_idle: u32,
    /// An idle connection older than this is closed instead of reused
    pub idle_timeout_ms: u64,
    pub max_lifetime_ms: u64,
    /// How long `acquire` waits on an exhausted pool before failing
    pub acquire_timeout_ms: u64,
    /// Upper bound on SQLite's wait for a database lock
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/adplace.db"),
            max_connections: 20,
            max_idle: 20,
            idle_timeout_ms: 1_000,
            max_lifetime_ms: 30_000,
            acquire_timeout_ms: 5_000,
            busy_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by any `ADPLACE_DB_*` variable that is set
    ///
    /// # Errors
    ///
    /// Returns a storage error when a numeric variable does not parse or the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(ENV_DB_PATH) {
            config.path = PathBuf::from(path);
        }
        read_env(ENV_MAX_CONNECTIONS, &mut config.max_connections)?;
        read_env(ENV_MAX_IDLE, &mut config.max_idle)?;
        read_env(ENV_IDLE_TIMEOUT_MS, &mut config.idle_timeout_ms)?;
        read_env(ENV_MAX_LIFETIME_MS, &mut config.max_lifetime_ms)?;
        read_env(ENV_ACQUIRE_TIMEOUT_MS, &mut config.acquire_timeout_ms)?;
        read_env(ENV_BUSY_TIMEOUT_MS, &mut config.busy_timeout_ms)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Fails when no connection could ever be opened, idle connections
    /// exceed the connection cap, or a pool timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(storage("store_config", "max_connections must be at least 1"));
        }
        for (name, ms) in [
            ("idle_timeout_ms", self.idle_timeout_ms),
            ("max_lifetime_ms", self.max_lifetime_ms),
            ("acquire_timeout_ms", self.acquire_timeout_ms),
        ] {
            if ms == 0 {
                return Err(storage("store_config", format!("{} must be positive", name)));
            }
        }
        if self.max_idle > self.max_connections {
            return Err(storage(
                "store_config",
                format!(
                    "max_idle ({}) exceeds max_connections ({})",
                    self.max_idle, self.max_connections
                ),
            ));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_millis(self.max_lifetime_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn read_env<T: std::str::FromStr>(key: &str, slot: &mut T) -> Result<()> {
    if let Ok(raw) = std::env::var(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| storage("store_config", format!("{} is not a number: {}", key, raw)))?;
    }
    Ok(())
}
