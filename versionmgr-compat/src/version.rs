//! Semantic version primitives.
//!
//! Ranges use the npm dialect the catalogs are written in (`^1.0.0`,
//! `>=1.0.0 <2.0.0`, `1.x || 2.x`, `1.0.0 - 1.4.0`). They are rewritten into
//! [`semver::VersionReq`] comparator sets. A bare version inside a range means
//! an exact match, unlike cargo where it implies a caret.

use semver::{Version, VersionReq};

// longest first, so `>=` wins over `>` and `~>` over `~`
const OPERATORS: [&str; 8] = ["~>", ">=", "<=", ">", "<", "=", "^", "~"];

/// A parsed range: the version must satisfy at least one alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    pub fn any() -> Self {
        Self {
            alternatives: vec![VersionReq::STAR],
        }
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

/// Parses a version string, tolerating surrounding whitespace and a leading
/// `v` or `=`.
pub fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// Whether `raw` is a valid semantic version.
pub fn is_valid(raw: &str) -> bool {
    parse_version(raw).is_some()
}

/// Parses an npm-style range. Returns `None` when any alternative is malformed.
pub fn parse_range(raw: &str) -> Option<VersionRange> {
    let alternatives = raw
        .split("||")
        .map(parse_alternative)
        .collect::<Option<Vec<_>>>()?;
    Some(VersionRange { alternatives })
}

/// Whether `version` satisfies `range`. Malformed input never matches.
pub fn satisfies(version: &str, range: &str) -> bool {
    match (parse_version(version), parse_range(range)) {
        (Some(version), Some(range)) => range.matches(&version),
        _ => false,
    }
}

fn parse_alternative(raw: &str) -> Option<VersionReq> {
    let trimmed = raw.trim();
    if matches!(trimmed, "" | "*" | "x" | "X") {
        return Some(VersionReq::STAR);
    }

    if let Some((low, high)) = trimmed.split_once(" - ") {
        let rewritten = format!(
            ">={}, <={}",
            strip_v(low.trim()),
            strip_v(high.trim())
        );
        return VersionReq::parse(&rewritten).ok();
    }

    let comparators = comparators(trimmed);
    if comparators.is_empty() {
        return Some(VersionReq::STAR);
    }
    VersionReq::parse(&comparators.join(", ")).ok()
}

fn comparators(raw: &str) -> Vec<String> {
    let normalized = raw.replace(',', " ");
    let mut result = Vec::new();
    let mut pending_operator: Option<&str> = None;

    for token in normalized.split_whitespace() {
        let (operator, version) = split_operator(token);
        if version.is_empty() {
            pending_operator = operator;
            continue;
        }

        let operator = operator.or_else(|| pending_operator.take());
        let version = strip_v(version);
        let comparator = match operator {
            Some("~>") => format!("~{version}"),
            Some(operator) => format!("{operator}{version}"),
            None if is_wildcard(version) => version.to_string(),
            None => format!("={version}"),
        };
        result.push(comparator);
    }

    result
}

fn split_operator(token: &str) -> (Option<&'static str>, &str) {
    match OPERATORS
        .iter()
        .find(|operator| token.starts_with(**operator))
    {
        Some(operator) => (Some(*operator), token[operator.len()..].trim_start()),
        None => (None, token),
    }
}

fn strip_v(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

fn is_wildcard(token: &str) -> bool {
    token
        .split('.')
        .any(|part| matches!(part, "x" | "X" | "*"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1.0.0" ; "plain")]
    #[test_case("v2.3.4" ; "leading v")]
    #[test_case(" 1.2.3 " ; "surrounding whitespace")]
    #[test_case("1.0.0-beta.1" ; "prerelease")]
    #[test_case("1.0.0+build.5" ; "build metadata")]
    fn accepts_valid_versions(raw: &str) {
        assert!(is_valid(raw));
    }

    #[test_case("" ; "empty")]
    #[test_case("not-a-version" ; "words")]
    #[test_case("1.0" ; "missing patch")]
    #[test_case("01.0.0" ; "leading zero")]
    #[test_case("1.0.0.0" ; "four parts")]
    #[test_case("версия" ; "unicode")]
    #[test_case("1.0.0; rm -rf /" ; "special characters")]
    fn rejects_invalid_versions(raw: &str) {
        assert!(!is_valid(raw));
    }

    #[test_case("1.4.2", "^1.0.0", true ; "caret inside major")]
    #[test_case("2.0.0", "^1.0.0", false ; "caret next major")]
    #[test_case("0.9.0", ">=1.0.0", false ; "below minimum")]
    #[test_case("1.0.0", ">=1.0.0", true ; "at minimum")]
    #[test_case("1.5.0", ">= 1.0.0 < 2.0.0", true ; "spaced comparator set")]
    #[test_case("2.1.0", ">=1.0.0 <2.0.0", false ; "outside comparator set")]
    #[test_case("1.2.9", "~1.2.0", true ; "tilde")]
    #[test_case("3.0.0", "1.x || >=3.0.0", true ; "alternatives")]
    #[test_case("1.3.0", "1.0.0 - 1.4.0", true ; "hyphen range")]
    #[test_case("1.0.1", "1.0.0", false ; "bare version is exact")]
    #[test_case("1.2.0", "^v1.0.0", true ; "caret with v prefix")]
    #[test_case("1.2.0", ">=v1.0.0", true ; "comparator with v prefix")]
    #[test_case("1.2.0", ">= v1.0.0 <V2.0.0", true ; "spaced set with v prefix")]
    #[test_case("1.2.0", "~>1.0", true ; "pessimistic tilde")]
    #[test_case("1.3.0", "~> 1.2.0", false ; "spaced pessimistic tilde")]
    #[test_case("1.0.0", "v1.0.0", true ; "bare version with v prefix")]
    #[test_case("1.3.0", "v1.0.0 - v1.4.0", true ; "hyphen range with v prefix")]
    #[test_case("7.7.7", "*", true ; "star")]
    #[test_case("7.7.7", "", true ; "empty range")]
    #[test_case("1.0.0-alpha", "*", false ; "star skips prereleases")]
    #[test_case("not-a-version", "*", false ; "invalid version never satisfies")]
    #[test_case("1.0.0", "^^nonsense", false ; "invalid range never satisfies")]
    fn range_satisfaction(version: &str, range: &str, expected: bool) {
        assert_eq!(satisfies(version, range), expected);
    }
}
