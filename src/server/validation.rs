//! Request validation utilities for the admin API.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::errors::PortalError;

/// Validation error type.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for PortalError {
    fn from(err: ValidationError) -> Self {
        PortalError::InvalidRequest(err.to_string())
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

/// Validate that a string is not empty or whitespace only.
///
/// # Example
/// ```
/// use license_portal::server::validation::validate_not_empty;
///
/// assert!(validate_not_empty("hello", "name").is_ok());
/// assert!(validate_not_empty("   ", "name").is_err());
/// ```
pub fn validate_not_empty(value: &str, field_name: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError {
            field: field_name.to_string(),
            message: "cannot be empty".to_string(),
        })
    } else {
        Ok(())
    }
}

/// Validate that a string's length is within bounds (in characters).
pub fn validate_length(
    value: &str,
    field_name: &str,
    min: usize,
    max: usize,
) -> ValidationResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        Err(ValidationError {
            field: field_name.to_string(),
            message: format!("must be between {min} and {max} characters"),
        })
    } else {
        Ok(())
    }
}

/// Validate an email address.
///
/// # Example
/// ```
/// use license_portal::server::validation::validate_email;
///
/// assert!(validate_email("ops@example.com", "email").is_ok());
/// assert!(validate_email("not-an-email", "email").is_err());
/// ```
pub fn validate_email(value: &str, field_name: &str) -> ValidationResult<()> {
    validate_length(value, field_name, 3, 254)?;
    if email_regex().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError {
            field: field_name.to_string(),
            message: "invalid email address".to_string(),
        })
    }
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn validate_datetime(value: &str, field_name: &str) -> ValidationResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError {
            field: field_name.to_string(),
            message: "invalid timestamp (expected RFC 3339, e.g. 2024-01-31T00:00:00Z)"
                .to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn email_validation() {
        assert!(validate_email("first.last+tag@mail.example.org", "email").is_ok());
        assert!(validate_email("a@b", "email").is_err());
        assert!(validate_email("@example.com", "email").is_err());
        assert!(validate_email("space in@example.com", "email").is_err());
    }

    #[test]
    fn length_is_counted_in_characters() {
        assert!(validate_length("ééé", "name", 1, 3).is_ok());
        assert!(validate_length("", "name", 1, 3).is_err());
        assert!(validate_length("abcd", "name", 1, 3).is_err());
    }

    #[test]
    fn datetime_is_normalized_to_utc() {
        let parsed = validate_datetime("2023-12-14T02:00:00+02:00", "expiration").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 12, 14, 0, 0, 0).unwrap());
        assert!(validate_datetime("2023-12-14", "expiration").is_err());
    }

    #[test]
    fn validation_error_becomes_invalid_request() {
        let err: PortalError = validate_not_empty("", "client_name").unwrap_err().into();
        assert!(matches!(err, PortalError::InvalidRequest(msg) if msg.contains("client_name")));
    }
}
