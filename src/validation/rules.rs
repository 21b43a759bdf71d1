//! Custom checks and patterns referenced from the `#[validate(...)]` attributes of the
//! request types, plus the date parsing they share with the handlers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    // Letters and whitespace only
    pub static ref NAME_REGEX: Regex = Regex::new(r"^[a-zA-Z\s]+$").unwrap();
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn presence(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(violation("required", message))
    } else {
        Ok(())
    }
}

pub fn title_present(value: &str) -> Result<(), ValidationError> {
    presence(value, "Title is required")
}

pub fn name_present(value: &str) -> Result<(), ValidationError> {
    presence(value, "Name is required")
}

pub fn email_present(value: &str) -> Result<(), ValidationError> {
    presence(value, "Email is required")
}

pub fn password_present(value: &str) -> Result<(), ValidationError> {
    presence(value, "Password is required")
}

pub fn calendar_date(value: &str) -> Result<(), ValidationError> {
    match parse_calendar_date(value) {
        Some(_) => Ok(()),
        None => Err(violation(
            "date",
            "Invalid date format - use ISO 8601 format (YYYY-MM-DD)",
        )),
    }
}

// Unparsable dates are left to `calendar_date`.
pub fn not_in_past(value: &str) -> Result<(), ValidationError> {
    match parse_calendar_date(value) {
        Some(due) if due < Utc::now() => Err(violation("past", "Due date cannot be in the past")),
        _ => Ok(()),
    }
}

/// ASCII letters and digits only, with at least one of each.
pub fn letters_and_digits(value: &str) -> Result<(), ValidationError> {
    let ok = value.chars().all(|c| c.is_ascii_alphanumeric())
        && value.chars().any(|c| c.is_ascii_alphabetic())
        && value.chars().any(|c| c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(violation(
            "password_strength",
            "Password must contain at least one letter and one number",
        ))
    }
}

pub fn known_role(value: &str) -> Result<(), ValidationError> {
    match value {
        "user" | "admin" => Ok(()),
        _ => Err(violation("role", "Role must be either user or admin")),
    }
}

/// Lower-cases the whole address. Provider-specific aliasing (dots, `+tags`) is kept.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Parses an ISO 8601 calendar date or date-time. Values without an offset are read as UTC,
/// a bare date as midnight UTC.
pub fn parse_calendar_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
