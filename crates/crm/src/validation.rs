//! Input checks run before anything reaches the database.
//! Every failure is a [`CrmError::Validation`].

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use crate::error::CrmError;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

pub const MIN_PASSWORD_LEN: usize = 12;

pub fn non_empty(field: &str, value: &str) -> Result<(), CrmError> {
    if value.trim().is_empty() {
        return Err(CrmError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Trimmed copy of a required text field.
pub fn required(field: &str, value: &str) -> Result<String, CrmError> {
    non_empty(field, value)?;
    Ok(value.trim().to_owned())
}

pub fn email(value: &str) -> Result<(), CrmError> {
    if !EMAIL.is_match(value) {
        return Err(CrmError::validation(format!("invalid email address: {value}")));
    }
    Ok(())
}

/// Checked, trimmed and lowercased email.
pub fn normalize_email(value: &str) -> Result<String, CrmError> {
    let normalized = value.trim().to_lowercase();
    email(&normalized)?;
    Ok(normalized)
}

/// Accepts 10 to 15 digits once spaces, dots, dashes, parentheses and a
/// leading `+` are removed. Returns the phone as given, trimmed.
pub fn phone(value: &str) -> Result<String, CrmError> {
    let trimmed = value.trim();
    let digits: String = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    if !(10..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CrmError::validation(format!(
            "invalid phone number: {trimmed} (expected 10 to 15 digits)"
        )));
    }
    Ok(trimmed.to_owned())
}

pub fn password_strength(password: &SecretString) -> Result<(), CrmError> {
    let raw = password.expose_secret();
    let mut missing = Vec::new();
    if raw.chars().count() < MIN_PASSWORD_LEN {
        missing.push("at least 12 characters");
    }
    if !raw.chars().any(|c| c.is_uppercase()) {
        missing.push("an uppercase letter");
    }
    if !raw.chars().any(|c| c.is_lowercase()) {
        missing.push("a lowercase letter");
    }
    if !raw.chars().any(|c| c.is_ascii_digit()) {
        missing.push("a digit");
    }
    if raw.chars().all(|c| c.is_alphanumeric()) {
        missing.push("a special character");
    }
    if !missing.is_empty() {
        return Err(CrmError::validation(format!(
            "password needs {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Largest amount, in cents, that storage can hold.
pub const MAX_AMOUNT: u64 = i64::MAX as u64;

pub fn amount(name: &str, cents: u64) -> Result<(), CrmError> {
    if cents > MAX_AMOUNT {
        return Err(CrmError::validation(format!(
            "{name} {cents} exceeds the maximum of {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

pub fn contract_amounts(total: u64, remaining: u64) -> Result<(), CrmError> {
    amount("total amount", total)?;
    amount("remaining amount", remaining)?;
    if remaining > total {
        return Err(CrmError::validation(format!(
            "remaining amount {remaining} exceeds total amount {total}"
        )));
    }
    Ok(())
}

pub fn event_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), CrmError> {
    if end <= start {
        return Err(CrmError::validation("event must end after it starts"));
    }
    Ok(())
}

pub fn attendees(count: u32) -> Result<(), CrmError> {
    if count == 0 {
        return Err(CrmError::validation("attendee count must be positive"));
    }
    Ok(())
}
