//! Field validation for incoming records.
//!
//! The store assumes every record it receives is already well formed; these
//! checks run at the HTTP boundary before a record reaches it.

use chrono::NaiveDate;
use thiserror::Error;

/// Flight dates are stored as `YYYY-MM-DD` strings
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError {
            field,
            reason: reason.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trim `value` and reject it when nothing is left.
pub fn non_empty(field: &'static str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Parse a calendar date and return it in canonical `YYYY-MM-DD` form.
pub fn flight_date(value: &str) -> ValidationResult<String> {
    let date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| ValidationError::new("date", format!("{value:?} is not YYYY-MM-DD ({e})")))?;
    Ok(date.format(DATE_FORMAT).to_string())
}

pub fn price(value: i64) -> ValidationResult<i64> {
    if value < 0 {
        return Err(ValidationError::new("price", "must not be negative"));
    }
    Ok(value)
}

/// Parse a phone number into its digits. Spaces, dashes, dots and parentheses
/// are ignored; anything else is rejected.
pub fn phone_number(value: &str) -> ValidationResult<i64> {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("phone", format!("{value:?} is not a phone number")));
    }

    digits
        .parse::<i64>()
        .map_err(|_| ValidationError::new("phone", format!("{value:?} is too long")))
}

/// Ids supplied by clients must be positive; zero or absent means "assign".
pub fn optional_id(field: &'static str, value: Option<i64>) -> ValidationResult<i64> {
    match value {
        None | Some(0) => Ok(0),
        Some(id) if id > 0 => Ok(id),
        Some(id) => Err(ValidationError::new(field, format!("{id} is not a positive id"))),
    }
}
