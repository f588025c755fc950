use serde::{Deserialize, Serialize};

use crate::errors::{AdError, Result};
use crate::rules::validation;

/// Lifecycle flag of an advertisement
///
/// The set is closed: stored as the lowercase text `active` / `inactive`.
/// Expiry never changes the status; only an explicit deactivation does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    #[default]
    Active,
    Inactive,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Active => "active",
            AdStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for AdStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdStatus {
    type Err = AdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(AdStatus::Active),
            "inactive" => Ok(AdStatus::Inactive),
            other => Err(AdError::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// Input for creating an advertisement
///
/// `ttl_minutes <= 0` means the advertisement never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAdvertisement {
    pub title: String,
    pub image_url: String,
    pub placement: String,
    #[serde(default)]
    pub ttl_minutes: i64,
}

impl NewAdvertisement {
    pub fn new(
        title: impl Into<String>,
        image_url: impl Into<String>,
        placement: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            image_url: image_url.into(),
            placement: placement.into(),
            ttl_minutes: 0,
        }
    }

    pub fn with_ttl_minutes(mut self, ttl_minutes: i64) -> Self {
        self.ttl_minutes = ttl_minutes;
        self
    }
}

/// A stored advertisement
///
/// This is exactly the persisted row. The `expired` flag is not part of it;
/// see [`evaluate_expiration`] and [`AdView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    /// UUID v4 assigned at creation
    pub id: String,
    pub title: String,
    pub image_url: String,
    /// Free-form tag for where the ad is shown (e.g. "homepage")
    pub placement: String,
    pub status: AdStatus,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds; `None` means the ad never expires
    pub expires_at: Option<i64>,
}

impl Advertisement {
    /// Build a brand new, fully populated record ready for insertion
    ///
    /// Assigns a fresh id, forces `Active`, stamps `created_at = now` and
    /// derives `expires_at` from the TTL.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any field fails the creation rules or
    /// the TTL overflows the timestamp range.
    pub fn create(new: NewAdvertisement, now: i64) -> Result<Self> {
        validation::validate_new_advertisement(&new)?;
        let expires_at = expiration_from_ttl(now, new.ttl_minutes)?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title,
            image_url: new.image_url,
            placement: new.placement,
            status: AdStatus::Active,
            created_at: now,
            expires_at,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == AdStatus::Active
    }

    /// Attach the read-time expiration flag without touching the record
    pub fn view_at(&self, now: i64) -> AdView {
        AdView {
            expired: evaluate_expiration(self, now),
            ad: self.clone(),
        }
    }

    pub fn into_view(self, now: i64) -> AdView {
        AdView {
            expired: evaluate_expiration(&self, now),
            ad: self,
        }
    }
}

/// Compute the expiration timestamp for a TTL given in minutes
///
/// Non-positive TTLs never expire.
///
/// # Errors
///
/// Returns `TtlOverflow` when `created_at + ttl_minutes * 60` does not fit.
pub fn expiration_from_ttl(created_at: i64, ttl_minutes: i64) -> Result<Option<i64>> {
    if ttl_minutes <= 0 {
        return Ok(None);
    }
    ttl_minutes
        .checked_mul(60)
        .and_then(|secs| created_at.checked_add(secs))
        .map(Some)
        .ok_or(AdError::TtlOverflow { ttl_minutes })
}

/// Whether a record has lapsed at `now`
///
/// True only when an expiration is set and `now` is strictly after it. A
/// record without an expiration never lapses.
pub fn evaluate_expiration(record: &Advertisement, now: i64) -> bool {
    match record.expires_at {
        Some(expires_at) => now > expires_at,
        None => false,
    }
}

/// Advertisement as returned across the boundary, with the derived flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdView {
    #[serde(flatten)]
    pub ad: Advertisement,
    pub expired: bool,
}

/// Current wall-clock time in unix seconds
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
