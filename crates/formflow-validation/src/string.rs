//! String validation functions
//!
//! Lengths are counted in characters, not bytes, so "héllo" has length 5.

use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern is valid"));

/// Outcome of a failed length check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthViolation {
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
}

/// Character count used by every length rule
pub fn char_length(s: &str) -> usize {
    s.chars().count()
}

/// Validates string length against optional bounds
pub fn check_length(
    s: &str,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), LengthViolation> {
    let actual = char_length(s);

    if let Some(min) = min {
        if actual < min {
            return Err(LengthViolation::TooShort { min, actual });
        }
    }

    if let Some(max) = max {
        if actual > max {
            return Err(LengthViolation::TooLong { max, actual });
        }
    }

    Ok(())
}

/// URL validation
///
/// Accepts absolute http, https, ftp and ftps URLs that carry a host.
pub fn is_valid_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https" | "ftp" | "ftps")
                && parsed.host_str().map(|h| !h.is_empty()).unwrap_or(false)
        }
        Err(_) => false,
    }
}

/// Slug: letters, numbers, underscores or hyphens
pub fn is_valid_slug(value: &str) -> bool {
    SLUG_REGEX.is_match(value)
}

/// Compile a pattern so that it must match the whole value
pub fn anchored_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

/// Full-match check against a pattern compiled by [`anchored_regex`]
pub fn matches_pattern(value: &str, regex: &Regex) -> bool {
    regex.is_match(value)
}
