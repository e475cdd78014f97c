//! Identity normalization for external member and vote identifiers
//!
//! Source exports carry ids in several degraded shapes: numeric ids with a
//! trailing `.0` left over from spreadsheet float coercion, ids embedded in
//! profile URLs, and display names that double as URL slugs. Everything here
//! is a pure function; callers handle a `None` as "unidentifiable record".

use once_cell::sync::Lazy;
use regex::Regex;

static PROFILE_URL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/meps/en/(\d+)").expect("valid regex"));

static TRAILING_ZERO_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.0+$").expect("valid regex"));

/// Canonicalize a raw external id string.
///
/// Numeric-looking ids are parsed and re-stringified so `"197400.0"` becomes
/// `"197400"`. Non-numeric ids pass through with any `.0` suffix stripped.
/// Empty strings and the spreadsheet artifact `"nan"` yield `None`.
pub fn normalize_external_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }

    if let Ok(num) = trimmed.parse::<f64>() {
        if num.is_finite() && num.fract() == 0.0 {
            return Some(format!("{}", num as i64));
        }
    }

    Some(TRAILING_ZERO_SUFFIX.replace(trimmed, "").into_owned())
}

/// Extract a member id from a parliament profile URL.
///
/// The EP profile pattern is `/meps/en/{id}/{NAME}/...`; anything that does
/// not match yields `None` rather than a guess.
pub fn member_id_from_profile_url(url: &str) -> Option<String> {
    PROFILE_URL_ID
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, drops anything outside `[a-z0-9 -]`, converts whitespace runs
/// to single hyphens, and trims leading/trailing hyphens. Not injective:
/// distinct names can collide, so slugs are display attributes only and
/// never identity keys.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_hyphen = true; // suppress leading hyphen
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_hyphen = false;
        } else if (ch.is_whitespace() || ch == '-') && !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Split a display name into (first, last) on the first space.
pub fn split_name(name: &str) -> (String, String) {
    let trimmed = name.trim();
    match trimmed.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_float_artifact() {
        assert_eq!(normalize_external_id("197400.0"), Some("197400".into()));
        assert_eq!(normalize_external_id("197400.000"), Some("197400".into()));
        assert_eq!(normalize_external_id("197400"), Some("197400".into()));
    }

    #[test]
    fn test_non_numeric_ids_pass_through() {
        assert_eq!(
            normalize_external_id("temp_jane-doe.0"),
            Some("temp_jane-doe".into())
        );
        assert_eq!(normalize_external_id("abc123"), Some("abc123".into()));
    }

    #[test]
    fn test_empty_and_nan_are_unidentifiable() {
        assert_eq!(normalize_external_id(""), None);
        assert_eq!(normalize_external_id("  "), None);
        assert_eq!(normalize_external_id("nan"), None);
        assert_eq!(normalize_external_id("NaN"), None);
    }

    #[test]
    fn test_profile_url_extraction() {
        assert_eq!(
            member_id_from_profile_url("https://www.europarl.europa.eu/meps/en/197400/JANE_DOE/home"),
            Some("197400".into())
        );
        assert_eq!(member_id_from_profile_url("https://example.com/about"), None);
        assert_eq!(member_id_from_profile_url(""), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Jane Doe"), "jane-doe");
        assert_eq!(slugify("  Esteban   González Pons "), "esteban-gonzlez-pons");
        assert_eq!(slugify("O'Brien (Independent)"), "obrien-independent");
    }

    #[test]
    fn test_slugify_collides_for_distinct_names() {
        // Documented non-injectivity: callers must treat this as a
        // data-quality condition, not an identity match.
        assert_eq!(slugify("Anna Maria"), slugify("Anna-Maria"));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("Jane Doe"), ("Jane".into(), "Doe".into()));
        assert_eq!(
            split_name("Esteban González Pons"),
            ("Esteban".into(), "González Pons".into())
        );
        assert_eq!(split_name("Madonna"), ("Madonna".into(), String::new()));
    }
}
