//! Error types for shiprail with contextual messages and exit codes
//!
//! Every failure the release workflow can produce is a variant of [`ShipError`].
//! Each variant maps to an [`ErrorKind`] (carried in step outcomes and JSON traces)
//! and to a default [`ExitCode`]. Inside the workflow the failing step's declared
//! exit code wins; the default mapping is used by the auxiliary commands.

use crate::release::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for shiprail
///
/// Values are stable across releases. 4 is retired: static analysis used to have
/// its own code and is now part of the quality gate category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitCode {
  Success = 0,
  /// Required tools or project files are missing, or the configuration is unusable
  PrerequisitesMissing = 1,
  /// Working tree or remote sync check failed
  RepoStateFailed = 2,
  /// Format, test or analysis gate failed
  QualityGateFailed = 3,
  /// Version metadata or changelog validation failed
  ChangelogInvalid = 5,
  /// Documentation generation or pre-publish validation failed
  PrePublishValidationFailed = 6,
  PublishFailed = 7,
  /// git commit/push/tag failed
  VersionControlFailed = 8,
  ReleaseCreationFailed = 9,
  UserCancelled = 10,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }

  /// Short category label shown next to failures
  pub fn label(self) -> &'static str {
    match self {
      ExitCode::Success => "success",
      ExitCode::PrerequisitesMissing => "prerequisites-missing",
      ExitCode::RepoStateFailed => "repo-state-failed",
      ExitCode::QualityGateFailed => "quality-gate-failed",
      ExitCode::ChangelogInvalid => "changelog-invalid",
      ExitCode::PrePublishValidationFailed => "pre-publish-validation-failed",
      ExitCode::PublishFailed => "publish-failed",
      ExitCode::VersionControlFailed => "version-control-failed",
      ExitCode::ReleaseCreationFailed => "release-creation-failed",
      ExitCode::UserCancelled => "user-cancelled",
    }
  }
}

impl fmt::Display for ExitCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.label(), self.as_i32())
  }
}

/// Failure category, recorded in step outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
  MissingPrerequisites,
  RepoDirty,
  RepoBehindRemote,
  QualityGateFailure,
  ManifestVersionMissing,
  InvalidVersionFormat,
  ChangelogVersionMissing,
  VersionMismatch,
  ChangelogNotesEmpty,
  DocGenerationFailure,
  PrePublishValidationFailure,
  PublishFailure,
  VersionControlOperationFailure,
  ReleaseCreationFailure,
  AuthenticationFailure,
  UserCancelled,
  ToolUnavailable,
  Config,
  Io,
  Internal,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ErrorKind::MissingPrerequisites => "MissingPrerequisites",
      ErrorKind::RepoDirty => "RepoDirty",
      ErrorKind::RepoBehindRemote => "RepoBehindRemote",
      ErrorKind::QualityGateFailure => "QualityGateFailure",
      ErrorKind::ManifestVersionMissing => "ManifestVersionMissing",
      ErrorKind::InvalidVersionFormat => "InvalidVersionFormat",
      ErrorKind::ChangelogVersionMissing => "ChangelogVersionMissing",
      ErrorKind::VersionMismatch => "VersionMismatch",
      ErrorKind::ChangelogNotesEmpty => "ChangelogNotesEmpty",
      ErrorKind::DocGenerationFailure => "DocGenerationFailure",
      ErrorKind::PrePublishValidationFailure => "PrePublishValidationFailure",
      ErrorKind::PublishFailure => "PublishFailure",
      ErrorKind::VersionControlOperationFailure => "VersionControlOperationFailure",
      ErrorKind::ReleaseCreationFailure => "ReleaseCreationFailure",
      ErrorKind::AuthenticationFailure => "AuthenticationFailure",
      ErrorKind::UserCancelled => "UserCancelled",
      ErrorKind::ToolUnavailable => "ToolUnavailable",
      ErrorKind::Config => "Config",
      ErrorKind::Io => "Io",
      ErrorKind::Internal => "Internal",
    };
    f.write_str(name)
  }
}

/// Main error type for shiprail
#[derive(Debug)]
pub enum ShipError {
  /// One or more required tools or files could not be found
  MissingPrerequisites { missing: Vec<String>, hints: Vec<String> },

  /// Working tree has uncommitted changes and the operator declined to continue
  RepoDirty { summary: String },

  /// Local branch is missing commits that exist on the remote
  RepoBehindRemote { remote: String, branch: String, behind: u64 },

  /// Formatting, tests or static analysis failed
  QualityGate { gate: String, exit_code: i32, output: String },

  /// Manifest has no `version:` line
  ManifestVersionMissing,

  /// Version string is not exactly `MAJOR.MINOR.PATCH`
  InvalidVersionFormat { raw: String },

  /// Changelog has no header for the version
  ChangelogVersionMissing { version: String },

  /// Manifest (or override) and latest changelog entry disagree
  VersionMismatch { manifest: Version, changelog: Version },

  /// `--version` names a different release than the manifest declares
  OverrideMismatch { requested: Version, manifest: Version },

  /// Changelog entry exists but has no body and no placeholder was accepted
  ChangelogNotesEmpty { version: Version },

  DocGeneration { exit_code: i32, output: String },

  PrePublishValidation { exit_code: i32, output: String },

  Publish { exit_code: i32, output: String },

  /// git operation errors
  Git(GitError),

  /// Code-hosting release errors
  Release(ReleaseError),

  /// Operator declined at a confirmation checkpoint
  UserCancelled { checkpoint: String, help: Option<String> },

  /// An external program could not be started at all
  ToolSpawn { program: String, source: io::Error },

  /// Configuration errors
  Config(ConfigError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ShipError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ShipError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ShipError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ShipError::Message { message, context, help } => ShipError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ShipError::Io(err) => ShipError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Failure category for step outcomes and traces
  pub fn kind(&self) -> ErrorKind {
    match self {
      ShipError::MissingPrerequisites { .. } => ErrorKind::MissingPrerequisites,
      ShipError::RepoDirty { .. } => ErrorKind::RepoDirty,
      ShipError::RepoBehindRemote { .. } => ErrorKind::RepoBehindRemote,
      ShipError::QualityGate { .. } => ErrorKind::QualityGateFailure,
      ShipError::ManifestVersionMissing => ErrorKind::ManifestVersionMissing,
      ShipError::InvalidVersionFormat { .. } => ErrorKind::InvalidVersionFormat,
      ShipError::ChangelogVersionMissing { .. } => ErrorKind::ChangelogVersionMissing,
      ShipError::VersionMismatch { .. } | ShipError::OverrideMismatch { .. } => ErrorKind::VersionMismatch,
      ShipError::ChangelogNotesEmpty { .. } => ErrorKind::ChangelogNotesEmpty,
      ShipError::DocGeneration { .. } => ErrorKind::DocGenerationFailure,
      ShipError::PrePublishValidation { .. } => ErrorKind::PrePublishValidationFailure,
      ShipError::Publish { .. } => ErrorKind::PublishFailure,
      ShipError::Git(_) => ErrorKind::VersionControlOperationFailure,
      ShipError::Release(ReleaseError::Authentication { .. }) => ErrorKind::AuthenticationFailure,
      ShipError::Release(_) => ErrorKind::ReleaseCreationFailure,
      ShipError::UserCancelled { .. } => ErrorKind::UserCancelled,
      ShipError::ToolSpawn { .. } => ErrorKind::ToolUnavailable,
      ShipError::Config(_) => ErrorKind::Config,
      ShipError::Io(_) => ErrorKind::Io,
      ShipError::Message { .. } => ErrorKind::Internal,
    }
  }

  /// Get the default exit code for this error
  ///
  /// The workflow overrides this with the failing step's declared exit code,
  /// except for cancellations which always exit with `UserCancelled`.
  pub fn exit_code(&self) -> ExitCode {
    match self.kind() {
      ErrorKind::MissingPrerequisites
      | ErrorKind::ToolUnavailable
      | ErrorKind::Config
      | ErrorKind::Io
      | ErrorKind::Internal => ExitCode::PrerequisitesMissing,
      ErrorKind::RepoDirty | ErrorKind::RepoBehindRemote => ExitCode::RepoStateFailed,
      ErrorKind::QualityGateFailure => ExitCode::QualityGateFailed,
      ErrorKind::ManifestVersionMissing
      | ErrorKind::InvalidVersionFormat
      | ErrorKind::ChangelogVersionMissing
      | ErrorKind::VersionMismatch
      | ErrorKind::ChangelogNotesEmpty => ExitCode::ChangelogInvalid,
      ErrorKind::DocGenerationFailure | ErrorKind::PrePublishValidationFailure => {
        ExitCode::PrePublishValidationFailed
      }
      ErrorKind::PublishFailure => ExitCode::PublishFailed,
      ErrorKind::VersionControlOperationFailure => ExitCode::VersionControlFailed,
      ErrorKind::ReleaseCreationFailure | ErrorKind::AuthenticationFailure => ExitCode::ReleaseCreationFailed,
      ErrorKind::UserCancelled => ExitCode::UserCancelled,
    }
  }

  /// Whether this error ends the run as a cancellation rather than a failure
  pub fn is_cancellation(&self) -> bool {
    matches!(self, ShipError::UserCancelled { .. })
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ShipError::MissingPrerequisites { hints, .. } if !hints.is_empty() => Some(hints.join("\n")),
      ShipError::RepoDirty { .. } => Some("Commit or stash your changes first.".to_string()),
      ShipError::RepoBehindRemote { remote, branch, .. } => {
        Some(format!("Pull changes first with: git pull {} {}", remote, branch))
      }
      ShipError::QualityGate { gate, .. } => Some(format!("Fix {} failures before publishing.", gate)),
      ShipError::ManifestVersionMissing => {
        Some("Add a line such as `version: 1.0.0` to the manifest.".to_string())
      }
      ShipError::InvalidVersionFormat { .. } => {
        Some("Use semantic versioning without pre-release or build suffixes: MAJOR.MINOR.PATCH".to_string())
      }
      ShipError::ChangelogVersionMissing { version } => Some(format!(
        "Add a `## [{}]` section with release notes to the changelog before publishing.",
        version
      )),
      ShipError::VersionMismatch { .. } => Some("Update one to match the other before publishing.".to_string()),
      ShipError::OverrideMismatch { requested, .. } => Some(format!(
        "Set `version: {}` in the manifest, or drop --version. The publisher uploads the manifest's version.",
        requested
      )),
      ShipError::ChangelogNotesEmpty { version } => Some(format!(
        "Write release notes under `## [{}]`, or set changelog.empty_notes = \"placeholder\".",
        version
      )),
      ShipError::Git(e) => e.help_message(),
      ShipError::Release(e) => e.help_message(),
      ShipError::ToolSpawn { program, .. } => Some(format!("Make sure `{}` is installed and on PATH.", program)),
      ShipError::Config(e) => e.help_message(),
      ShipError::UserCancelled { help, .. } => help.clone(),
      ShipError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ShipError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ShipError::MissingPrerequisites { missing, .. } => {
        write!(f, "Missing prerequisites: {}", missing.join(", "))
      }
      ShipError::RepoDirty { summary } => {
        write!(f, "Working tree has uncommitted changes:\n{}", summary)
      }
      ShipError::RepoBehindRemote { remote, branch, behind } => write!(
        f,
        "Local branch is behind {}/{} by {} commit(s)",
        remote, branch, behind
      ),
      ShipError::QualityGate { gate, exit_code, output } => {
        write!(f, "{} failed (exit code {})", gate, exit_code)?;
        write_output(f, output)
      }
      ShipError::ManifestVersionMissing => {
        write!(f, "Could not find a `version:` line in the manifest")
      }
      ShipError::InvalidVersionFormat { raw } => {
        write!(f, "Invalid version format '{}'", raw)
      }
      ShipError::ChangelogVersionMissing { version } => {
        write!(f, "Version {} not found in changelog", version)
      }
      ShipError::VersionMismatch { manifest, changelog } => write!(
        f,
        "Version mismatch: manifest has {}, but changelog latest is {}",
        manifest, changelog
      ),
      ShipError::OverrideMismatch { requested, manifest } => write!(
        f,
        "Version mismatch: --version is {}, but the manifest declares {}",
        requested, manifest
      ),
      ShipError::ChangelogNotesEmpty { version } => {
        write!(f, "Changelog entry for {} has no release notes", version)
      }
      ShipError::DocGeneration { exit_code, output } => {
        write!(f, "Documentation generation failed (exit code {})", exit_code)?;
        write_output(f, output)
      }
      ShipError::PrePublishValidation { exit_code, output } => {
        write!(f, "Pre-publish validation failed (exit code {})", exit_code)?;
        write_output(f, output)
      }
      ShipError::Publish { exit_code, output } => {
        write!(f, "Publish failed (exit code {})", exit_code)?;
        write_output(f, output)
      }
      ShipError::Git(e) => write!(f, "{}", e),
      ShipError::Release(e) => write!(f, "{}", e),
      ShipError::UserCancelled { checkpoint, .. } => write!(f, "Aborted by user at: {}", checkpoint),
      ShipError::ToolSpawn { program, source } => write!(f, "Failed to run {}: {}", program, source),
      ShipError::Config(e) => write!(f, "{}", e),
      ShipError::Io(e) => write!(f, "I/O error: {}", e),
      ShipError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

fn write_output(f: &mut fmt::Formatter<'_>, output: &str) -> fmt::Result {
  let output = output.trim();
  if output.is_empty() {
    Ok(())
  } else {
    write!(f, "\n{}", output)
  }
}

impl std::error::Error for ShipError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ShipError::Io(e) => Some(e),
      ShipError::ToolSpawn { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for ShipError {
  fn from(err: io::Error) -> Self {
    ShipError::Io(err)
  }
}

impl From<String> for ShipError {
  fn from(msg: String) -> Self {
    ShipError::message(msg)
  }
}

impl From<&str> for ShipError {
  fn from(msg: &str) -> Self {
    ShipError::message(msg)
  }
}

impl From<GitError> for ShipError {
  fn from(err: GitError) -> Self {
    ShipError::Git(err)
  }
}

impl From<ConfigError> for ShipError {
  fn from(err: ConfigError) -> Self {
    ShipError::Config(err)
  }
}

impl From<toml_edit::de::Error> for ShipError {
  fn from(err: toml_edit::de::Error) -> Self {
    ShipError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for ShipError {
  fn from(err: toml_edit::ser::Error) -> Self {
    ShipError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for ShipError {
  fn from(err: serde_json::Error) -> Self {
    ShipError::message(format!("JSON error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Explicit --config path does not exist
  NotFound { path: PathBuf },

  /// Config parsed but a value is out of range
  Invalid { field: String, reason: String },

  /// Configured step order violates the workflow invariants
  InvalidOrder { reason: String },

  /// Project file referenced by the config does not exist
  MissingFile { what: String, path: PathBuf },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `shiprail init` to create a configuration file.".to_string()),
      ConfigError::InvalidOrder { .. } => Some(
        "Mutating steps (publish, commit-and-push, create-tag, create-release) must come after \
         validate-changelog and confirm in workflow.order."
          .to_string(),
      ),
      ConfigError::MissingFile { what, .. } => {
        Some(format!("Set project.{} in shiprail.toml if the file lives elsewhere.", what))
      }
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Configuration file not found: {}", path.display())
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid configuration value for {}: {}", field, reason)
      }
      ConfigError::InvalidOrder { reason } => {
        write!(f, "Invalid workflow order: {}", reason)
      }
      ConfigError::MissingFile { what, path } => {
        write!(f, "{} not found at {}", what, path.display())
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Push failed
  PushFailed {
    remote: String,
    refspec: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") || reason.contains("rejected") {
          Some("The remote has commits you don't have. Pull first, then re-run; completed steps will be skipped.".to_string())
        } else if reason.contains("Permission denied") || reason.contains("403") {
          Some("Check your SSH key permissions and remote access.".to_string())
        } else {
          None
        }
      }
      GitError::CommandFailed { stderr, .. } if stderr.contains("not a git repository") => {
        Some("Run shiprail from inside the package's git repository.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}", command)?;
        write_output(f, stderr)
      }
      GitError::PushFailed { remote, refspec, reason } => {
        write!(f, "Push of {} to {} failed", refspec, remote)?;
        write_output(f, reason)
      }
    }
  }
}

/// Code-hosting release errors
#[derive(Debug)]
pub enum ReleaseError {
  /// Release tool rejected our credentials
  Authentication {
    tag: String,
    output: String,
    credential_env: String,
  },

  /// Any other release creation failure
  Failed { tag: String, exit_code: i32, output: String },
}

impl ReleaseError {
  fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Authentication { credential_env, .. } => Some(format!(
        "Release tool authentication failed. If {env} is set (even to an invalid value), it takes \
         precedence over your interactive login. Clear it first:\n      \
         PowerShell: $env:{env} = \"\"\n      \
         Bash: unset {env}\n      \
         Then run: gh auth status",
        env = credential_env
      )),
      ReleaseError::Failed { tag, .. } => Some(format!(
        "To create it manually, run:\n      gh release create {tag} --title \"Release {tag}\" --notes-file CHANGELOG.md",
        tag = tag
      )),
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Authentication { tag, output, .. } => {
        write!(f, "Authentication failed while creating release {}", tag)?;
        write_output(f, output)
      }
      ReleaseError::Failed { tag, exit_code, output } => {
        write!(f, "Release {} creation failed (exit code {})", tag, exit_code)?;
        write_output(f, output)
      }
    }
  }
}

/// Result type alias for shiprail
pub type ShipResult<T> = Result<T, ShipError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ShipResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ShipResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ShipError>,
{
  fn context(self, ctx: impl Into<String>) -> ShipResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ShipResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ShipError) {
  eprintln!("\n❌ [{}] {}\n", error.kind(), error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exit_codes_are_distinct() {
    let codes = [
      ExitCode::Success,
      ExitCode::PrerequisitesMissing,
      ExitCode::RepoStateFailed,
      ExitCode::QualityGateFailed,
      ExitCode::ChangelogInvalid,
      ExitCode::PrePublishValidationFailed,
      ExitCode::PublishFailed,
      ExitCode::VersionControlFailed,
      ExitCode::ReleaseCreationFailed,
      ExitCode::UserCancelled,
    ];
    let mut values: Vec<i32> = codes.iter().map(|c| c.as_i32()).collect();
    values.sort_unstable();
    values.dedup();
    assert_eq!(values.len(), codes.len());
    assert_eq!(ExitCode::UserCancelled.as_i32(), 10);
  }

  #[test]
  fn test_auth_failure_help_names_credential_variable() {
    let err = ShipError::Release(ReleaseError::Authentication {
      tag: "v1.0.0".to_string(),
      output: "HTTP 401: Bad credentials".to_string(),
      credential_env: "GITHUB_TOKEN".to_string(),
    });
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    assert_eq!(err.exit_code(), ExitCode::ReleaseCreationFailed);
    let help = err.help_message().unwrap();
    assert!(help.contains("unset GITHUB_TOKEN"));
  }

  #[test]
  fn test_context_wraps_io_errors() {
    let err: ShipResult<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone").into());
    let err = err.context("Failed to read manifest").unwrap_err();
    assert!(err.to_string().starts_with("Failed to read manifest"));
  }

  #[test]
  fn test_behind_remote_help_mentions_pull() {
    let err = ShipError::RepoBehindRemote {
      remote: "origin".to_string(),
      branch: "main".to_string(),
      behind: 2,
    };
    assert_eq!(err.exit_code(), ExitCode::RepoStateFailed);
    assert_eq!(err.help_message().unwrap(), "Pull changes first with: git pull origin main");
  }
}
