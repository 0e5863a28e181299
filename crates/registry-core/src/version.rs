//! Client version comparison.
//!
//! Clients report free-form version strings (`"5.1.2-ice35-b40"`,
//! `"OMERO.py 5.0"`). Only the first dotted numeric run is compared, and the
//! components are compared as strings, not numbers: `"10"` sorts before
//! `"2"`. Anything that cannot be parsed counts as outdated.

use std::sync::LazyLock;

use regex::Regex;

/// First `N.N` or `N.N.N` run anywhere in the string.
static NUMERIC_RUN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"[0-9]+\.[0-9]+(?:\.[0-9]+)?").expect("static pattern")
});

/// Result of checking a client against the canonical version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeCheck {
  Current,
  Outdated,
}

/// Extract the first dotted numeric run, e.g. `"1.2.3"` from `"v1.2.3-rc1"`.
pub fn extract_numeric_run(s: &str) -> Option<&str> {
  NUMERIC_RUN.find(s).map(|m| m.as_str())
}

/// `true` if `client` is older than `canonical`.
///
/// If either side has no numeric run the client is considered outdated.
pub fn is_outdated(client: &str, canonical: &str) -> bool {
  let (Some(client), Some(canonical)) =
    (extract_numeric_run(client), extract_numeric_run(canonical))
  else {
    return true;
  };

  let client: Vec<&str> = client.split('.').collect();
  let canonical: Vec<&str> = canonical.split('.').collect();
  client < canonical
}

/// Decide whether to nudge the client. A client that sent no version is left
/// alone.
pub fn check(client: Option<&str>, canonical: &str) -> UpgradeCheck {
  match client {
    Some(v) if is_outdated(v, canonical) => UpgradeCheck::Outdated,
    _ => UpgradeCheck::Current,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_first_run_from_decorated_strings() {
    assert_eq!(extract_numeric_run("1.2.3"), Some("1.2.3"));
    assert_eq!(extract_numeric_run("5.1.2-ice35-b40"), Some("5.1.2"));
    assert_eq!(extract_numeric_run("OMERO.py 5.0"), Some("5.0"));
    assert_eq!(extract_numeric_run("-4.4.12-"), Some("4.4.12"));
    assert_eq!(extract_numeric_run("1.2.3.4"), Some("1.2.3"));
    assert_eq!(extract_numeric_run("build 7"), None);
  }

  #[test]
  fn older_is_outdated() {
    assert!(is_outdated("0.0.0", "1.2.3"));
    assert!(is_outdated("1.2.2", "1.2.3"));
    assert!(is_outdated("1.2", "1.2.3"));
  }

  #[test]
  fn equal_or_newer_is_current() {
    assert!(!is_outdated("1.2.3", "1.2.3"));
    assert!(!is_outdated("1.2.4", "1.2.3"));
    assert!(!is_outdated("5.1.2-ice35-b40", "5.1.2"));
    assert!(!is_outdated("1.3", "1.2.3"));
  }

  #[test]
  fn components_compare_as_strings() {
    // "10" < "9" as strings, so 1.10.0 reads as older than 1.9.0.
    assert!(is_outdated("1.10.0", "1.9.0"));
    assert!(!is_outdated("1.9.0", "1.10.0"));
    assert!(is_outdated("10.0", "2.0"));
  }

  #[test]
  fn unparseable_is_outdated() {
    assert!(is_outdated("dev", "1.2.3"));
    assert!(is_outdated("1.2.3", "unknown"));
    assert!(is_outdated("", "1.2.3"));
  }

  #[test]
  fn missing_client_version_is_current() {
    assert_eq!(check(None, "1.2.3"), UpgradeCheck::Current);
    assert_eq!(check(Some("garbage"), "1.2.3"), UpgradeCheck::Outdated);
    assert_eq!(check(Some("1.2.3"), "1.2.3"), UpgradeCheck::Current);
  }
}
