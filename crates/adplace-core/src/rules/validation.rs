use url::Url;

use crate::errors::{AdError, Result};
use crate::model::NewAdvertisement;

/// Validate every field of a creation request
///
/// # Errors
///
/// Returns the first rule violated, checked in field order.
pub fn validate_new_advertisement(new: &NewAdvertisement) -> Result<()> {
    validate_title(&new.title)?;
    validate_image_url(&new.image_url)?;
    validate_placement(&new.placement)?;
    Ok(())
}

/// Title must contain at least one non-whitespace character
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AdError::EmptyTitle);
    }
    Ok(())
}

/// Placement is free-form, but never blank
pub fn validate_placement(placement: &str) -> Result<()> {
    if placement.trim().is_empty() {
        return Err(AdError::EmptyPlacement);
    }
    Ok(())
}

/// Image URL must be absolute: a scheme and a host
pub fn validate_image_url(raw: &str) -> Result<()> {
    let invalid = |reason: String| AdError::InvalidImageUrl {
        url: raw.to_string(),
        reason,
    };

    if raw.trim().is_empty() {
        return Err(invalid("URL is empty".to_string()));
    }

    let parsed = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if parsed.host_str().is_none() {
        return Err(invalid("URL has no host".to_string()));
    }
    Ok(())
}

/// Identifier used to address an existing record
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(AdError::EmptyId);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_rejected() {
        assert_eq!(validate_title("   "), Err(AdError::EmptyTitle));
        assert!(validate_title("Summer sale").is_ok());
    }

    #[test]
    fn test_absolute_urls_accepted() {
        assert!(validate_image_url("https://x/a.png").is_ok());
        assert!(validate_image_url("http://cdn.example.com/img/banner.jpg?v=2").is_ok());
    }

    #[test]
    fn test_relative_and_hostless_urls_rejected() {
        assert!(matches!(
            validate_image_url("/images/a.png"),
            Err(AdError::InvalidImageUrl { .. })
        ));
        assert!(matches!(
            validate_image_url("not a url"),
            Err(AdError::InvalidImageUrl { .. })
        ));
        assert!(matches!(
            validate_image_url("mailto:ads@example.com"),
            Err(AdError::InvalidImageUrl { .. })
        ));
        assert!(matches!(
            validate_image_url(""),
            Err(AdError::InvalidImageUrl { .. })
        ));
    }

    #[test]
    fn test_new_advertisement_checks_all_fields() {
        let ok = NewAdvertisement::new("A", "https://x/a.png", "sidebar");
        assert!(validate_new_advertisement(&ok).is_ok());

        let no_placement = NewAdvertisement::new("A", "https://x/a.png", " ");
        assert_eq!(
            validate_new_advertisement(&no_placement),
            Err(AdError::EmptyPlacement)
        );
    }

    #[test]
    fn test_empty_id_rejected() {
        assert_eq!(validate_id(""), Err(AdError::EmptyId));
        assert!(validate_id("x").is_ok());
    }
}
