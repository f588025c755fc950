//! Argument types for the selection and update operations
//!
//! These carry caller intent only. Turning them into SQL is the store's job;
//! the in-memory `matches` predicate exists so behavior can be checked
//! against a reference without a database.

pub mod filters;
pub mod update;

pub use filters::SelectAdsArgs;
pub use update::UpdateAdsArgs;
