//! Required tools and project files
//!
//! Every requirement is checked even after one is missing, so the operator sees
//! the full list in one run.

use crate::core::config::ToolRequirement;
use crate::core::error::{ShipError, ShipResult};
use crate::gateway::ToolGateway;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Lookup result for one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
  pub name: String,
  /// Resolved executable, `None` when not found
  pub path: Option<PathBuf>,
  #[serde(skip)]
  pub hint: Option<String>,
}

impl ToolStatus {
  pub fn found(&self) -> bool {
    self.path.is_some()
  }
}

/// Existence check for one project file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
  /// Config key naming the file (`manifest`, `changelog`)
  pub what: String,
  pub path: PathBuf,
  pub found: bool,
}

/// Aggregate of all prerequisite lookups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrerequisiteReport {
  pub tools: Vec<ToolStatus>,
  pub files: Vec<FileStatus>,
}

impl PrerequisiteReport {
  /// Names of everything that wasn't found, tools first
  pub fn missing(&self) -> Vec<String> {
    let tools = self.tools.iter().filter(|t| !t.found()).map(|t| t.name.clone());
    let files = self
      .files
      .iter()
      .filter(|f| !f.found)
      .map(|f| f.path.display().to_string());
    tools.chain(files).collect()
  }

  pub fn is_satisfied(&self) -> bool {
    self.missing().is_empty()
  }

  /// `Ok(self)` when everything was found, `MissingPrerequisites` otherwise
  pub fn into_result(self) -> ShipResult<Self> {
    let missing = self.missing();
    if missing.is_empty() {
      return Ok(self);
    }

    let tool_hints = self
      .tools
      .iter()
      .filter(|t| !t.found())
      .filter_map(|t| t.hint.as_ref().map(|hint| format!("{}: {}", t.name, hint)));
    let file_hints = self.files.iter().filter(|f| !f.found).map(|f| {
      format!(
        "{}: set project.{} in shiprail.toml if the file lives elsewhere",
        f.path.display(),
        f.what
      )
    });

    Err(ShipError::MissingPrerequisites {
      missing,
      hints: tool_hints.chain(file_hints).collect(),
    })
  }
}

/// Look up every tool through the gateway
pub fn check_all(gateway: &dyn ToolGateway, tools: &[ToolRequirement]) -> PrerequisiteReport {
  let tools = tools
    .iter()
    .map(|tool| ToolStatus {
      name: tool.name.clone(),
      path: gateway.locate(&tool.name),
      hint: tool.hint.clone(),
    })
    .collect();

  PrerequisiteReport {
    tools,
    files: Vec::new(),
  }
}

/// Add existence checks for project files (paths relative to `root`)
pub fn check_files(mut report: PrerequisiteReport, root: &Path, files: &[(&str, &Path)]) -> PrerequisiteReport {
  report.files.extend(files.iter().map(|(what, path)| FileStatus {
    what: what.to_string(),
    path: path.to_path_buf(),
    found: root.join(path).is_file(),
  }));
  report
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::ErrorKind;
  use crate::gateway::fake::FakeGateway;

  fn requirements() -> Vec<ToolRequirement> {
    ["flutter", "git", "gh"]
      .into_iter()
      .map(|name| ToolRequirement {
        name: name.to_string(),
        hint: Some(format!("Install {}", name)),
      })
      .collect()
  }

  #[test]
  fn test_all_tools_present() {
    let fake = FakeGateway::new();
    let report = check_all(&fake, &requirements());
    assert!(report.is_satisfied());
    assert!(report.into_result().is_ok());
  }

  #[test]
  fn test_checks_every_tool_after_a_miss() {
    let fake = FakeGateway::new();
    fake.without_tool("flutter").without_tool("gh");
    let report = check_all(&fake, &requirements());
    assert_eq!(report.tools.len(), 3);
    assert_eq!(report.missing(), vec!["flutter", "gh"]);

    let err = report.into_result().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingPrerequisites);
    let help = err.help_message().unwrap();
    assert!(help.contains("flutter: Install flutter"));
    assert!(help.contains("gh: Install gh"));
  }

  #[test]
  fn test_missing_project_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pubspec.yaml"), "version: 1.0.0\n").unwrap();

    let fake = FakeGateway::new();
    let report = check_files(
      check_all(&fake, &[]),
      dir.path(),
      &[
        ("manifest", Path::new("pubspec.yaml")),
        ("changelog", Path::new("CHANGELOG.md")),
      ],
    );
    assert_eq!(report.missing(), vec!["CHANGELOG.md"]);
    let err = report.into_result().unwrap_err();
    assert!(err.help_message().unwrap().contains("project.changelog"));
  }
}
