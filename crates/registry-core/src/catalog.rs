//! Reference catalog — the small, uniquely keyed lookup tables a hit points
//! into.
//!
//! Catalog rows are append-only: a value is inserted the first time it is
//! observed and reused forever after. Nothing in this system updates or
//! deletes them.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

use crate::{Error, Result};

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// A client attribute recorded in its own append-only dictionary table.
///
/// The mapping from request parameter to table and hit column is fixed here,
/// so the request handler can walk [`Dimension::iter`] instead of naming each
/// field.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
  AgentVersion,
  OsName,
  OsArch,
  OsVersion,
  JavaVendor,
  JavaVersion,
  PythonVersion,
  PythonCompiler,
  PythonBuild,
}

impl Dimension {
  /// Query-string / form key the client sends this attribute under.
  pub fn request_key(self) -> &'static str {
    match self {
      Self::AgentVersion => "version",
      Self::OsName => "os.name",
      Self::OsArch => "os.arch",
      Self::OsVersion => "os.version",
      Self::JavaVendor => "java.vm.vendor",
      Self::JavaVersion => "java.runtime.version",
      Self::PythonVersion => "python.version",
      Self::PythonCompiler => "python.compiler",
      Self::PythonBuild => "python.build",
    }
  }

  /// Name of the dictionary table.
  pub fn table(self) -> &'static str {
    match self {
      Self::AgentVersion => "agent_versions",
      Self::OsName => "os_names",
      Self::OsArch => "os_archs",
      Self::OsVersion => "os_versions",
      Self::JavaVendor => "java_vendors",
      Self::JavaVersion => "java_versions",
      Self::PythonVersion => "python_versions",
      Self::PythonCompiler => "python_compilers",
      Self::PythonBuild => "python_builds",
    }
  }

  /// The unique value column of [`Self::table`]. Versions are stored under
  /// `version`, everything else under `name`.
  pub fn column(self) -> &'static str {
    match self {
      Self::AgentVersion
      | Self::OsVersion
      | Self::JavaVersion
      | Self::PythonVersion => "version",
      Self::OsName
      | Self::OsArch
      | Self::JavaVendor
      | Self::PythonCompiler
      | Self::PythonBuild => "name",
    }
  }

  /// Foreign-key column on the `hits` table.
  pub fn hit_column(self) -> &'static str {
    match self {
      Self::AgentVersion => "agent_version_id",
      Self::OsName => "os_name_id",
      Self::OsArch => "os_arch_id",
      Self::OsVersion => "os_version_id",
      Self::JavaVendor => "java_vendor_id",
      Self::JavaVersion => "java_version_id",
      Self::PythonVersion => "python_version_id",
      Self::PythonCompiler => "python_compiler_id",
      Self::PythonBuild => "python_build_id",
    }
  }

  /// Stable snake_case name, e.g. `"os_name"`.
  pub fn name(self) -> &'static str { self.into() }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One row of a dimension table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
  pub id:        i64,
  pub dimension: Dimension,
  pub value:     String,
}

/// A recognised client product. Agents are registered by an operator; the
/// request path only ever looks them up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
  pub agent_id:     i64,
  /// Matched exactly against the `User-Agent` header.
  pub agent_name:   String,
  pub display_name: String,
}

/// A client address row. The geolocation columns that sit next to it in the
/// schema are filled by external enrichment and are not modelled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpEntry {
  pub ip_id: i64,
  pub ip:    IpAddr,
}

/// Parse the textual address taken from a request header.
pub fn parse_client_addr(raw: &str) -> Result<IpAddr> {
  raw
    .trim()
    .parse()
    .map_err(|_| Error::InvalidAddress(raw.to_owned()))
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn request_keys_are_unique() {
    let mut keys: Vec<_> = Dimension::iter().map(Dimension::request_key).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), Dimension::iter().count());
  }

  #[test]
  fn names_are_snake_case() {
    assert_eq!(Dimension::OsName.name(), "os_name");
    assert_eq!(Dimension::PythonCompiler.name(), "python_compiler");
    let mut names: Vec<_> = Dimension::iter().map(Dimension::name).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), Dimension::iter().count());
  }

  #[test]
  fn parses_v4_and_v6_addresses() {
    assert_eq!(
      parse_client_addr(" 11.22.33.44 ").unwrap().to_string(),
      "11.22.33.44"
    );
    assert!(parse_client_addr("::1").unwrap().is_ipv6());
    assert!(matches!(
      parse_client_addr("unknown"),
      Err(Error::InvalidAddress(_))
    ));
  }
}
