//! Client-side input checks, run before any request leaves the device.

use regex::Regex;
use std::sync::LazyLock;

use crate::constants::limits::MAX_SEARCH_QUERY_LEN;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static FULL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid name regex"));

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid username regex"));

static SEARCH_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s\-(),.+]+$").expect("valid query regex"));

pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters long";
pub const PASSWORD_NO_UPPERCASE: &str = "Password must contain at least one uppercase letter";
pub const PASSWORD_NO_LOWERCASE: &str = "Password must contain at least one lowercase letter";
pub const PASSWORD_NO_DIGIT: &str = "Password must contain at least one number";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordCheck {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

#[must_use]
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// At least 8 characters with one uppercase letter, one lowercase letter and one digit.
#[must_use]
pub fn validate_password(password: &str) -> PasswordCheck {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push(PASSWORD_TOO_SHORT);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(PASSWORD_NO_UPPERCASE);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(PASSWORD_NO_LOWERCASE);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(PASSWORD_NO_DIGIT);
    }

    PasswordCheck {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[must_use]
pub fn validate_full_name(name: &str) -> bool {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    (2..=100).contains(&len) && FULL_NAME_RE.is_match(trimmed)
}

#[must_use]
pub fn validate_username(username: &str) -> bool {
    let trimmed = username.trim();
    let len = trimmed.chars().count();
    (3..=30).contains(&len) && USERNAME_RE.is_match(trimmed)
}

/// Escapes markup-significant characters before text is echoed back anywhere.
#[must_use]
pub fn sanitize_input(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn validate_search_query(query: &str) -> bool {
    let trimmed = query.trim();
    let len = trimmed.chars().count();
    (1..=MAX_SEARCH_QUERY_LEN).contains(&len) && SEARCH_QUERY_RE.is_match(trimmed)
}
