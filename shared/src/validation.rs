//! Input validation helpers
//!
//! Plain functions used by the backend's `validator` derives and by
//! request normalization before anything reaches the store.

use validator::ValidationError;

/// Normalize an email address the way the credential store keeps it:
/// surrounding whitespace removed, lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a publish year: three or four ASCII digits
pub fn validate_publish_year(year: &str) -> Result<(), ValidationError> {
    let well_formed =
        (3..=4).contains(&year.len()) && year.bytes().all(|b| b.is_ascii_digit());

    if well_formed {
        Ok(())
    } else {
        let mut err = ValidationError::new("publish_year");
        err.message = Some("Publish year must be 3 or 4 digits".into());
        Err(err)
    }
}
