//! Package version resolution from line-oriented manifests
//!
//! A manifest declares the package with top-level `name:` and `version:` keys
//! (e.g. `pubspec.yaml`). Only keys at column 0 count, so nested `version:`
//! entries under dependency tables are never picked up.

use crate::core::error::{ShipError, ShipResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Release version: exactly `MAJOR.MINOR.PATCH`, no pre-release or build metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
}

impl Version {
  pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
    Self { major, minor, patch }
  }

  /// Git tag for this version (`v1.2.3`)
  pub fn tag_name(&self) -> String {
    format!("v{}", self)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
  }
}

impl FromStr for Version {
  type Err = ShipError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    validate_format(s)
  }
}

impl Serialize for Version {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Version {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    validate_format(&raw).map_err(serde::de::Error::custom)
  }
}

/// Parse a version string, accepting only three dot-separated integers
///
/// Leading zeros are rejected (`01.2.3`) so every accepted string round-trips
/// through `Display` unchanged.
pub fn validate_format(raw: &str) -> ShipResult<Version> {
  let invalid = || ShipError::InvalidVersionFormat { raw: raw.to_string() };

  let mut parts = raw.split('.');
  let well_formed = (0..3).all(|_| {
    parts
      .next()
      .is_some_and(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
  }) && parts.next().is_none();

  if !well_formed {
    return Err(invalid());
  }

  // semver rejects leading zeros and out-of-range components for us
  let parsed = semver::Version::parse(raw).map_err(|_| invalid())?;

  Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
}

/// Extract the package version from manifest text
pub fn extract_version(manifest_text: &str) -> ShipResult<Version> {
  let raw = find_top_level_key(manifest_text, "version").ok_or(ShipError::ManifestVersionMissing)?;
  validate_format(&raw)
}

/// Extract the package name from manifest text
pub fn extract_package_name(manifest_text: &str) -> ShipResult<String> {
  find_top_level_key(manifest_text, "name")
    .filter(|name| !name.is_empty())
    .ok_or_else(|| {
      ShipError::with_help(
        "Could not find a `name:` line in the manifest",
        "Add a top-level line such as `name: my_package` to the manifest.",
      )
    })
}

/// Fail unless both versions are identical in every component
///
/// A changelog ahead of the manifest is as wrong as one behind it.
pub fn cross_validate(manifest: &Version, changelog: &Version) -> ShipResult<()> {
  if manifest != changelog {
    return Err(ShipError::VersionMismatch {
      manifest: *manifest,
      changelog: *changelog,
    });
  }
  Ok(())
}

/// Find `key: value` at column 0, stripping quotes and trailing comments
fn find_top_level_key(text: &str, key: &str) -> Option<String> {
  text.lines().find_map(|line| {
    let rest = line.strip_prefix(key)?.strip_prefix(':')?;
    let value = match rest.find(" #") {
      Some(idx) => &rest[..idx],
      None => rest,
    };
    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
    Some(value.to_string())
  })
}
