use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\+91)?[6-9][0-9]{9}$").unwrap());

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

pub fn validate_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

/// Trim an optional string, collapsing blanks to None
pub fn sanitize_optional(input: Option<String>) -> Option<String> {
    input
        .map(|s| sanitize_string(&s))
        .filter(|s| !s.is_empty())
}

/// `%term%` for a LIKE comparison, with the term's own wildcards escaped
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
