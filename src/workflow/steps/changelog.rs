use super::checkpoint;
use crate::core::config::EmptyNotesPolicy;
use crate::core::error::{ConfigError, ResultExt, ShipError, ShipResult};
use crate::release::changelog;
use crate::release::version::{cross_validate, extract_package_name, extract_version};
use crate::workflow::context::{ReleaseTarget, RunContext};
use crate::workflow::outcome::StepReport;
use crate::workflow::step::{Step, StepId};
use std::fs;
use std::path::Path;

/// Lines of release notes echoed in the step output
const NOTES_PREVIEW_LINES: usize = 10;

/// Cross-check manifest and changelog and establish the release target
///
/// This is the only step that sets `RunState::release`. Every mutating step
/// depends on it.
pub struct ValidateChangelog;

impl Step for ValidateChangelog {
  fn id(&self) -> StepId {
    StepId::ValidateChangelog
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let project = &ctx.config.project;
    let manifest = read_project_file(&ctx.project_path(&project.manifest), "manifest")?;
    let document = read_project_file(&ctx.project_path(&project.changelog), "changelog")?;

    let package = extract_package_name(&manifest)?;
    let version = match ctx.options.version {
      Some(requested) => requested,
      None => extract_version(&manifest)?,
    };

    let latest = changelog::latest_entry(&document).ok_or_else(|| ShipError::ChangelogVersionMissing {
      version: version.to_string(),
    })?;
    cross_validate(&version, &latest.version)?;

    let mut report = StepReport::done().info(format!("Found version {} in {}", version, project.changelog.display()));
    if let Some(requested) = ctx.options.version {
      // The publisher uploads whatever the manifest declares
      match extract_version(&manifest) {
        Ok(declared) if declared != requested => {
          return Err(ShipError::OverrideMismatch {
            requested,
            manifest: declared,
          });
        }
        Ok(_) => {}
        Err(err) => {
          report = report.warn(format!(
            "Releasing {} from --version; manifest version not checked ({})",
            requested, err
          ));
        }
      }
    }

    let notes = if latest.notes.is_empty() {
      let placeholder = format!("Release {}", version.tag_name());
      let condition = ShipError::ChangelogNotesEmpty { version };
      let warning = match ctx.config.changelog.empty_notes {
        EmptyNotesPolicy::Fail => return Err(condition),
        EmptyNotesPolicy::Placeholder => condition.to_string(),
        EmptyNotesPolicy::Prompt => checkpoint(
          ctx,
          condition,
          &format!("Use generic message '{}'?", placeholder),
          &[],
          "empty release notes",
        )?,
      };
      report = report.warn(format!("{}; using \"{}\"", warning, placeholder));
      placeholder
    } else {
      let lines: Vec<&str> = latest.notes.lines().collect();
      for line in lines.iter().take(NOTES_PREVIEW_LINES) {
        report = report.info(format!("  {}", line));
      }
      if lines.len() > NOTES_PREVIEW_LINES {
        report = report.info("  ...");
      }
      latest.notes
    };

    ctx.state.release = Some(ReleaseTarget {
      package,
      version,
      notes,
    });
    Ok(report)
  }
}

fn read_project_file(path: &Path, what: &str) -> ShipResult<String> {
  if !path.exists() {
    return Err(ShipError::Config(ConfigError::MissingFile {
      what: what.to_string(),
      path: path.to_path_buf(),
    }));
  }
  fs::read_to_string(path).with_context(|| format!("Failed to read {} {}", what, path.display()))
}
