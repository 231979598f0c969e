//! Notes command: release notes straight from the changelog

use crate::core::context::ProjectContext;
use crate::core::error::{ResultExt, ShipError, ShipResult};
use crate::release::changelog;
use crate::release::version::Version;
use std::fs;

/// Print the notes for `version`, or for the latest entry
pub fn run_notes(ctx: &ProjectContext, version: Option<Version>, json: bool) -> ShipResult<()> {
  let path = ctx.path(&ctx.config.project.changelog);
  let document =
    fs::read_to_string(&path).with_context(|| format!("Failed to read changelog {}", path.display()))?;

  let (version, notes) = find_notes(&document, version)?;
  if json {
    let value = serde_json::json!({ "version": version, "notes": notes });
    println!("{}", serde_json::to_string_pretty(&value)?);
  } else if notes.is_empty() {
    eprintln!("⚠️  {} has no release notes in {}", version, path.display());
  } else {
    println!("{}", notes);
  }
  Ok(())
}

fn find_notes(document: &str, version: Option<Version>) -> ShipResult<(Version, String)> {
  match version {
    Some(version) => Ok((version, changelog::extract_notes(document, &version)?)),
    None => changelog::latest_entry(document)
      .map(|entry| (entry.version, entry.notes))
      .ok_or_else(|| {
        ShipError::with_help(
          "Changelog has no version entries",
          "Add a header like `## [1.0.0]` followed by the release notes",
        )
      }),
  }
}
