//! Input validation for API requests.
//!
//! Each function returns the message to show for the offending field. Use
//! `ValidationErrorBuilder` from the `error` module to collect several.

use chrono::NaiveTime;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Letters, digits, dot, dash and underscore; 3-32 chars
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9._-]{3,32}$").unwrap();

    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)+$"
    ).unwrap();
}

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_TITLE_LEN: usize = 200;
const MAX_COMMENT_LEN: usize = 2000;
/// One week
const MAX_DURATION_MINUTES: i64 = 7 * 24 * 60;

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username must be 3-32 characters of letters, digits, '.', '-' or '_'".to_string(),
        );
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(format!(
            "Password is too long (max {} characters)",
            MAX_PASSWORD_LEN
        ));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Title is required".to_string());
    }
    if trimmed.len() > MAX_TITLE_LEN {
        return Err(format!("Title is too long (max {} characters)", MAX_TITLE_LEN));
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price < 0.0 {
        return Err("Price must be a non-negative number".to_string());
    }
    Ok(())
}

/// Service duration in minutes
pub fn validate_duration(duration: i64) -> Result<(), String> {
    if duration <= 0 {
        return Err("Duration must be a positive number of minutes".to_string());
    }
    if duration > MAX_DURATION_MINUTES {
        return Err(format!(
            "Duration is too long (max {} minutes)",
            MAX_DURATION_MINUTES
        ));
    }
    Ok(())
}

/// 0 = Monday through 6 = Sunday
pub fn validate_day_of_week(day: i64) -> Result<(), String> {
    if !(0..=6).contains(&day) {
        return Err("Day of week must be between 0 (Monday) and 6 (Sunday)".to_string());
    }
    Ok(())
}

pub fn validate_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), String> {
    if start >= end {
        return Err("Start time must be before end time".to_string());
    }
    Ok(())
}

pub fn validate_rating(rating: i64) -> Result<(), String> {
    if !(1..=5).contains(&rating) {
        return Err("Rating must be between 1 and 5".to_string());
    }
    Ok(())
}

pub fn validate_comment(comment: &Option<String>) -> Result<(), String> {
    if let Some(c) = comment {
        if c.len() > MAX_COMMENT_LEN {
            return Err(format!(
                "Comment is too long (max {} characters)",
                MAX_COMMENT_LEN
            ));
        }
    }
    Ok(())
}
