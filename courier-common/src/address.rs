//! Email address validation
//!
//! Addresses are kept as plain strings throughout courier; this module is
//! the one place that decides whether a string is an acceptable mailbox.

use crate::ValidationError;

/// Validate and normalise an email address.
///
/// Surrounding whitespace is trimmed. The address must parse as an
/// RFC 5321 mailbox and carry a dotted domain.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidEmail`] if the address is rejected.
pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();

    let address: lettre::Address = email
        .parse()
        .map_err(|_| ValidationError::InvalidEmail(email.to_string()))?;

    let domain = address.domain();
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    Ok(email.to_string())
}

/// Key used for case-insensitive comparison of addresses.
#[must_use]
pub fn normalise(email: &str) -> String {
    email.trim().to_lowercase()
}
