//! Input validation utilities
//!
//! The registry stores whatever it is given; callers check user input with
//! these helpers first.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate password and its confirmation
pub fn validate_password(password: &str, confirmation: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if password != confirmation {
        return Err("Passwords do not match".to_string());
    }

    Ok(())
}

/// Validate age in years
pub fn validate_age(age: u32) -> Result<(), String> {
    if age == 0 || age > 120 {
        return Err("Please enter a valid age (1-120)".to_string());
    }
    Ok(())
}

/// Validate height in centimetres
pub fn validate_height(height_cm: f64) -> Result<(), String> {
    if !(height_cm > 0.0 && height_cm <= 300.0) {
        return Err("Please enter a valid height (1-300 cm)".to_string());
    }
    Ok(())
}

/// Validate weight in kilograms
pub fn validate_weight(weight_kg: f64) -> Result<(), String> {
    if !(weight_kg > 0.0 && weight_kg <= 500.0) {
        return Err("Please enter a valid weight (1-500 kg)".to_string());
    }
    Ok(())
}

/// Validate a non-negative amount such as grams of protein
pub fn validate_amount(field: &str, value: f64) -> Result<(), String> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(format!("{} must be a non-negative number", field));
    }
    Ok(())
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}
