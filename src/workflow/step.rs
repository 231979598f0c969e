//! Step identity, declared properties and the `Step` trait

use crate::core::error::{ExitCode, ShipResult};
use crate::workflow::context::RunContext;
use crate::workflow::outcome::StepReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every step the release workflow knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
  CheckPrerequisites,
  CheckRepoState,
  CheckRemoteSync,
  Format,
  Test,
  Analyze,
  ValidateChangelog,
  GenerateDocs,
  PrePublishValidate,
  Confirm,
  Publish,
  CommitAndPush,
  CreateTag,
  CreateRelease,
}

impl StepId {
  /// Default sequence
  pub const DEFAULT_ORDER: [StepId; 14] = [
    StepId::CheckPrerequisites,
    StepId::CheckRepoState,
    StepId::CheckRemoteSync,
    StepId::Format,
    StepId::Test,
    StepId::Analyze,
    StepId::ValidateChangelog,
    StepId::GenerateDocs,
    StepId::PrePublishValidate,
    StepId::Confirm,
    StepId::Publish,
    StepId::CommitAndPush,
    StepId::CreateTag,
    StepId::CreateRelease,
  ];

  /// Kebab-case identifier used in config and traces
  pub fn as_str(self) -> &'static str {
    match self {
      StepId::CheckPrerequisites => "check-prerequisites",
      StepId::CheckRepoState => "check-repo-state",
      StepId::CheckRemoteSync => "check-remote-sync",
      StepId::Format => "format",
      StepId::Test => "test",
      StepId::Analyze => "analyze",
      StepId::ValidateChangelog => "validate-changelog",
      StepId::GenerateDocs => "generate-docs",
      StepId::PrePublishValidate => "pre-publish-validate",
      StepId::Confirm => "confirm",
      StepId::Publish => "publish",
      StepId::CommitAndPush => "commit-and-push",
      StepId::CreateTag => "create-tag",
      StepId::CreateRelease => "create-release",
    }
  }

  /// Human-readable title for the reporter
  pub fn title(self) -> &'static str {
    match self {
      StepId::CheckPrerequisites => "Checking prerequisites",
      StepId::CheckRepoState => "Checking working tree",
      StepId::CheckRemoteSync => "Checking remote sync",
      StepId::Format => "Formatting code",
      StepId::Test => "Running tests",
      StepId::Analyze => "Running static analysis",
      StepId::ValidateChangelog => "Validating changelog",
      StepId::GenerateDocs => "Generating documentation",
      StepId::PrePublishValidate => "Pre-publish validation",
      StepId::Confirm => "Confirming release",
      StepId::Publish => "Publishing package",
      StepId::CommitAndPush => "Committing and pushing",
      StepId::CreateTag => "Creating tag",
      StepId::CreateRelease => "Creating release",
    }
  }

  /// Whether the step changes state outside the working tree
  pub fn mutates(self) -> bool {
    matches!(
      self,
      StepId::Publish | StepId::CommitAndPush | StepId::CreateTag | StepId::CreateRelease
    )
  }

  /// Whether the step may only run once the release target has been validated
  pub fn needs_release(self) -> bool {
    self == StepId::Confirm || self.mutates()
  }

  /// Exit code the run ends with when this step fails
  pub fn failure_exit_code(self) -> ExitCode {
    match self {
      StepId::CheckPrerequisites => ExitCode::PrerequisitesMissing,
      StepId::CheckRepoState | StepId::CheckRemoteSync => ExitCode::RepoStateFailed,
      StepId::Format | StepId::Test | StepId::Analyze => ExitCode::QualityGateFailed,
      StepId::ValidateChangelog => ExitCode::ChangelogInvalid,
      StepId::GenerateDocs | StepId::PrePublishValidate => ExitCode::PrePublishValidationFailed,
      StepId::Confirm => ExitCode::UserCancelled,
      StepId::Publish => ExitCode::PublishFailed,
      StepId::CommitAndPush | StepId::CreateTag => ExitCode::VersionControlFailed,
      StepId::CreateRelease => ExitCode::ReleaseCreationFailed,
    }
  }
}

impl fmt::Display for StepId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StepId {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    StepId::DEFAULT_ORDER
      .into_iter()
      .find(|id| id.as_str() == s)
      .ok_or_else(|| format!("unknown step '{}'", s))
  }
}

/// What a step failure means for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
  /// Halt the run with the step's exit code
  #[default]
  Fatal,
  /// Record the failure and continue
  Warn,
}

/// Platform a step can be skipped on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Windows,
  Macos,
  Linux,
}

impl Platform {
  pub fn current() -> Option<Self> {
    if cfg!(windows) {
      Some(Platform::Windows)
    } else if cfg!(target_os = "macos") {
      Some(Platform::Macos)
    } else if cfg!(target_os = "linux") {
      Some(Platform::Linux)
    } else {
      None
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Platform::Windows => write!(f, "windows"),
      Platform::Macos => write!(f, "macos"),
      Platform::Linux => write!(f, "linux"),
    }
  }
}

/// A single workflow step
///
/// Steps hold no state of their own. `is_satisfied` is the idempotency check and
/// must be read-only because it also runs in dry-run mode. For mutating steps
/// the orchestrator calls `describe` instead of `run` in dry-run.
pub trait Step {
  fn id(&self) -> StepId;

  /// Reason the step's effect is already in place, if it is
  fn is_satisfied(&self, _ctx: &RunContext<'_>) -> ShipResult<Option<String>> {
    Ok(None)
  }

  /// What `run` would do, one line per action
  fn describe(&self, _ctx: &RunContext<'_>) -> ShipResult<Vec<String>> {
    Ok(Vec::new())
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport>;
}
