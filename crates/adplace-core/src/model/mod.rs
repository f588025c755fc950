//! Advertisement record model

pub mod advertisement;

pub use advertisement::{
    evaluate_expiration, expiration_from_ttl, unix_now, AdStatus, AdView, Advertisement,
    NewAdvertisement,
};
