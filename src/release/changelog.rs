//! Release notes extraction from Keep-a-Changelog style documents
//!
//! Entries start at a level-2 header naming a version, either `## [1.2.3]` or
//! `## 1.2.3`, optionally followed by anything else on the line (a date, a link).
//! The body runs until the next version header or the end of the document.
//! Entries are listed most-recent-first, so document order 0 is the latest release.
//!
//! Lines that look like headers but don't carry a strict `X.Y.Z` version
//! (`## [Unreleased]`, `### Fixed`, `## [1.0.0-beta]`) are body text.

use crate::core::error::{ShipError, ShipResult};
use crate::release::version::{Version, validate_format};
use serde::Serialize;
use std::iter::Peekable;
use std::str::Lines;

/// One versioned block of release notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogEntry {
  pub version: Version,
  /// Body text, trimmed of leading and trailing blank lines
  pub notes: String,
  /// Position in the document (0 = topmost = latest)
  pub document_order: usize,
}

/// Lazy iterator over changelog entries in document order
///
/// Pure function of the input text. Cloning snapshots the current position;
/// calling [`parse`] again starts from the top.
#[derive(Debug, Clone)]
pub struct ChangelogEntries<'a> {
  lines: Peekable<Lines<'a>>,
  next_order: usize,
}

impl Iterator for ChangelogEntries<'_> {
  type Item = ChangelogEntry;

  fn next(&mut self) -> Option<Self::Item> {
    let version = loop {
      let line = self.lines.next()?;
      if let Some(version) = parse_header(line) {
        break version;
      }
    };

    let mut body = Vec::new();
    while let Some(line) = self.lines.peek() {
      if parse_header(line).is_some() {
        break;
      }
      body.push(*line);
      self.lines.next();
    }

    let entry = ChangelogEntry {
      version,
      notes: trim_blank_lines(&body),
      document_order: self.next_order,
    };
    self.next_order += 1;
    Some(entry)
  }
}

/// Parse a changelog into entries, latest first
pub fn parse(document: &str) -> ChangelogEntries<'_> {
  ChangelogEntries {
    lines: document.lines().peekable(),
    next_order: 0,
  }
}

/// The topmost (latest) entry, if the document has any version header
pub fn latest_entry(document: &str) -> Option<ChangelogEntry> {
  parse(document).next()
}

/// Release notes for `version`
///
/// Returns an empty string when the header exists but the body is blank; callers
/// decide whether that is acceptable. Fails with `ChangelogVersionMissing` when
/// no header names the version.
pub fn extract_notes(document: &str, version: &Version) -> ShipResult<String> {
  parse(document)
    .find(|entry| entry.version == *version)
    .map(|entry| entry.notes)
    .ok_or_else(|| ShipError::ChangelogVersionMissing {
      version: version.to_string(),
    })
}

/// Recognize `## [X.Y.Z]...` or `## X.Y.Z...`
fn parse_header(line: &str) -> Option<Version> {
  let rest = line.strip_prefix("##")?;
  if rest.starts_with('#') {
    return None;
  }
  let rest = rest.trim_start();
  let (rest, bracketed) = match rest.strip_prefix('[') {
    Some(inner) => (inner, true),
    None => (rest, false),
  };

  let end = rest
    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
    .unwrap_or(rest.len());
  let (candidate, tail) = rest.split_at(end);
  let version = validate_format(candidate).ok()?;

  let terminated = if bracketed {
    tail.starts_with(']')
  } else {
    tail.is_empty() || tail.starts_with(char::is_whitespace)
  };
  terminated.then_some(version)
}

fn trim_blank_lines(lines: &[&str]) -> String {
  let start = lines.iter().position(|l| !l.trim().is_empty());
  let end = lines.iter().rposition(|l| !l.trim().is_empty());
  match (start, end) {
    (Some(start), Some(end)) => lines[start..=end].join("\n"),
    _ => String::new(),
  }
}
