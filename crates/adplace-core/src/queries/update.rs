use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::model::AdStatus;
use crate::rules::validation;

/// Partial update of one advertisement
///
/// Each optional field follows "absent means unchanged". There is no way to
/// clear a field: every updatable column is NOT NULL. `created_at` and
/// `expires_at` are immutable and deliberately not represented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAdsArgs {
    pub id: String,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub placement: Option<String>,
    pub status: Option<AdStatus>,
}

impl UpdateAdsArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// The explicit Active -> Inactive transition
    pub fn deactivate(id: impl Into<String>) -> Self {
        Self::new(id).with_status(AdStatus::Inactive)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_placement(mut self, placement: impl Into<String>) -> Self {
        self.placement = Some(placement.into());
        self
    }

    pub fn with_status(mut self, status: AdStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// True when no field would change
    pub fn is_noop(&self) -> bool {
        self.title.is_none()
            && self.image_url.is_none()
            && self.placement.is_none()
            && self.status.is_none()
    }

    /// Check the identifier and every supplied value
    ///
    /// # Errors
    ///
    /// `EmptyId` when the id is empty, otherwise the first field rule that
    /// a supplied value breaks.
    pub fn validate(&self) -> Result<()> {
        validation::validate_id(&self.id)?;
        if let Some(title) = &self.title {
            validation::validate_title(title)?;
        }
        if let Some(image_url) = &self.image_url {
            validation::validate_image_url(image_url)?;
        }
        if let Some(placement) = &self.placement {
            validation::validate_placement(placement)?;
        }
        Ok(())
    }
}
