//! ID derivation, slugs, and timestamps.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an RFC 3339 string (second precision).
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert a name to a URL-friendly slug: lowercase, runs of
/// non-alphanumerics collapsed to `-`, leading/trailing `-` trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Derive the uppercase project key from a name: the first letter of each
/// alphanumeric word. Empty input falls back to "PRJ".
pub fn derive_key(name: &str) -> String {
    let key: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .filter_map(|w| w.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if key.is_empty() {
        "PRJ".to_string()
    } else {
        key
    }
}

/// Check whether a string matches the issue ID pattern `KEY-N`
/// (uppercase alphanumeric key starting with a letter, numeric suffix).
pub fn is_issue_id(name: &str) -> bool {
    let Some((key, num)) = name.split_once('-') else {
        return false;
    };
    let mut chars = key.chars();
    let starts_upper = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    starts_upper
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && !num.is_empty()
        && num.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Test App"), "test-app");
        assert_eq!(slugify("  My -- Cool  Project!  "), "my-cool-project");
        assert_eq!(slugify("already-slugged"), "already-slugged");
        assert_eq!(slugify("UPPER case"), "upper-case");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_derive_key() {
        assert_eq!(derive_key("Test App"), "TA");
        assert_eq!(derive_key("my cool project"), "MCP");
        assert_eq!(derive_key("single"), "S");
        assert_eq!(derive_key("42 things"), "4T");
        assert_eq!(derive_key(""), "PRJ");
        assert_eq!(derive_key("---"), "PRJ");
    }

    #[test]
    fn test_is_issue_id() {
        assert!(is_issue_id("TA-1"));
        assert!(is_issue_id("PRJ-42"));
        assert!(is_issue_id("A2B-7"));
        assert!(!is_issue_id("ta-1"));
        assert!(!is_issue_id("TA1"));
        assert!(!is_issue_id("TA-"));
        assert!(!is_issue_id("-1"));
        assert!(!is_issue_id("TA-x"));
        assert!(!is_issue_id("2A-1"));
    }

    #[test]
    fn test_now_is_rfc3339_utc() {
        let ts = now();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
