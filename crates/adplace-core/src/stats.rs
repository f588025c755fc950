//! Aggregate counts over a set of advertisements
//!
//! Expired is orthogonal to status: an inactive ad whose expiration passed is
//! counted in both `inactive` and `expired`.

use serde::Serialize;

use crate::model::{evaluate_expiration, AdStatus, Advertisement};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub expired: u64,
}

impl AdStats {
    /// Count a result set at a single instant `now`
    pub fn collect<'a, I>(ads: I, now: i64) -> Self
    where
        I: IntoIterator<Item = &'a Advertisement>,
    {
        ads.into_iter().fold(Self::default(), |mut stats, ad| {
            stats.total += 1;
            match ad.status {
                AdStatus::Active => stats.active += 1,
                AdStatus::Inactive => stats.inactive += 1,
            }
            if evaluate_expiration(ad, now) {
                stats.expired += 1;
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad(status: AdStatus, expires_at: Option<i64>) -> Advertisement {
        Advertisement {
            id: uuid::Uuid::new_v4().to_string(),
            title: "t".to_string(),
            image_url: "https://x/a.png".to_string(),
            placement: "homepage".to_string(),
            status,
            created_at: 0,
            expires_at,
        }
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(AdStats::collect(&[], 0), AdStats::default());
    }

    #[test]
    fn test_counts_status_and_expiry_independently() {
        let ads = vec![
            ad(AdStatus::Active, None),
            ad(AdStatus::Active, Some(50)),
            ad(AdStatus::Inactive, Some(10)),
            ad(AdStatus::Inactive, Some(100)),
        ];

        let stats = AdStats::collect(&ads, 100);
        assert_eq!(
            stats,
            AdStats {
                total: 4,
                active: 2,
                inactive: 2,
                expired: 2,
            }
        );
    }
}
