//! AdPlace Core - advertisement record model and query arguments
//!
//! This crate holds everything about advertisements that does not touch a
//! database:
//! - The `Advertisement` record, its `AdStatus` lifecycle flag and the pure
//!   read-time expiration evaluator
//! - Creation and update validation rules
//! - Selection filters and partial-update arguments consumed by the store
//! - Aggregate statistics over a result set
//! - The structured error facility and the logging facility shared by the
//!   store and engine crates

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod queries;
pub mod rules;
pub mod stats;

pub use adplace_core_types as core_types;

// Re-export commonly used types
pub use errors::{AdError, ExError, ExErrorKind, Result};
pub use model::{evaluate_expiration, unix_now, AdStatus, AdView, Advertisement, NewAdvertisement};
pub use queries::{SelectAdsArgs, UpdateAdsArgs};
pub use stats::AdStats;
