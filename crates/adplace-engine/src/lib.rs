//! AdPlace Engine - Orchestration layer
//!
//! Provides the advertisement commands callers invoke: each one opens the
//! sessions it needs on an `AdStore`, applies model rules, attaches the
//! request's correlation ids to any error and owns boundary logging.

pub mod commands;
pub mod metrics;

pub use metrics::{AdMetrics, MetricsSnapshot};
