//! Subcommand implementations and the options they share

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use adplace_core_types::RequestContext;
use adplace_store::config::ENV_DB_PATH;
use adplace_store::{AdStore, OpContext, StoreConfig};

pub mod ads;
pub mod migrate;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// SQLite database file; other pool settings come from ADPLACE_DB_* variables
    #[arg(long, global = true, env = ENV_DB_PATH)]
    pub db: Option<PathBuf>,

    /// Give up on the operation after this many milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Correlation id to report in errors and logs; generated when absent
    #[arg(long, global = true, env = "ADPLACE_REQUEST_ID")]
    pub request_id: Option<String>,

    /// W3C traceparent of the caller's span
    #[arg(long, global = true, env = "TRACEPARENT")]
    pub traceparent: Option<String>,
}

impl GlobalArgs {
    pub fn open_store(&self) -> Result<AdStore, Box<dyn std::error::Error>> {
        let mut config = StoreConfig::from_env()?;
        if let Some(db) = &self.db {
            config.path = db.clone();
        }
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(AdStore::open(config)?)
    }

    pub fn request_context(&self) -> RequestContext {
        RequestContext::from_headers(self.request_id.as_deref(), self.traceparent.as_deref())
    }

    pub fn op_context(&self) -> OpContext {
        match self.timeout_ms {
            Some(ms) => OpContext::with_timeout(Duration::from_millis(ms)),
            None => OpContext::background(),
        }
    }
}

/// Write a value to stdout as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
