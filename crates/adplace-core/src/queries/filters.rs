use serde::{Deserialize, Serialize};

use crate::model::{evaluate_expiration, AdStatus, Advertisement};

/// Filters for advertisement selection
///
/// Every field is optional. `None` means "no constraint on that column";
/// present fields are combined with AND. String filters are exact matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectAdsArgs {
    pub id: Option<String>,
    pub title: Option<String>,
    pub status: Option<AdStatus>,
    pub placement: Option<String>,

    /// Keep only lapsed (`true`) or only live (`false`) ads, judged at `now`
    pub expired: Option<bool>,

    /// Maximum number of rows to return
    pub limit: Option<u32>,
    /// Number of rows to skip (applied after ordering)
    pub offset: Option<u32>,
}

impl SelectAdsArgs {
    /// No filters: every stored advertisement
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::default().with_id(id)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: AdStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_placement(mut self, placement: impl Into<String>) -> Self {
        self.placement = Some(placement.into());
        self
    }

    pub fn with_expired(mut self, expired: bool) -> Self {
        self.expired = Some(expired);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Drop string filters that are present but empty
    ///
    /// Query-string adapters produce `Some("")` for `?placement=`; the
    /// reference behavior treats that as "not supplied".
    pub fn normalized(mut self) -> Self {
        for field in [&mut self.id, &mut self.title, &mut self.placement] {
            if field.as_deref() == Some("") {
                *field = None;
            }
        }
        self
    }

    /// True when no predicate is present (paging does not count)
    pub fn is_unfiltered(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.status.is_none()
            && self.placement.is_none()
            && self.expired.is_none()
    }

    /// Evaluate the predicates against one record
    ///
    /// Paging (`limit`/`offset`) is not a predicate and is ignored here.
    pub fn matches(&self, ad: &Advertisement, now: i64) -> bool {
        self.id.as_ref().map_or(true, |v| &ad.id == v)
            && self.title.as_ref().map_or(true, |v| &ad.title == v)
            && self.status.map_or(true, |v| ad.status == v)
            && self.placement.as_ref().map_or(true, |v| &ad.placement == v)
            && self
                .expired
                .map_or(true, |v| evaluate_expiration(ad, now) == v)
    }
}
