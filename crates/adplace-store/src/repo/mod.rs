//! Repository layer: SQL assembly and advertisement persistence

pub mod ads_repo;
pub mod builder;

pub use ads_repo::{get_ad, insert_ad, row_to_advertisement, select_ads, select_ads_at, update_ads};
pub use builder::{BuiltQuery, SelectBuilder, UpdateBuilder};
