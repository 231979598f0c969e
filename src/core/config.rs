use crate::core::error::{ConfigError, ResultExt, ShipError, ShipResult};
use crate::workflow::step::{FailurePolicy, Platform, StepId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// File name written by `shiprail init`
pub const CONFIG_FILE_NAME: &str = "shiprail.toml";

/// Configuration for shiprail
/// Searched in order: shiprail.toml, .shiprail.toml, .config/shiprail.toml
///
/// Every section is optional; a project without a config file runs with the
/// defaults below (a Flutter package on GitHub).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipConfig {
  #[serde(default)]
  pub project: ProjectConfig,
  /// External programs that must be on PATH
  #[serde(default = "default_tools")]
  pub tools: Vec<ToolRequirement>,
  #[serde(default)]
  pub commands: CommandsConfig,
  #[serde(default)]
  pub release: ReleaseToolConfig,
  #[serde(default)]
  pub workflow: WorkflowConfig,
  /// Per-step overrides keyed by step id (`[steps.analyze]`)
  #[serde(default)]
  pub steps: BTreeMap<String, StepConfig>,
  #[serde(default)]
  pub changelog: ChangelogConfig,
  #[serde(default)]
  pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
  /// Manifest declaring `name:` and `version:` (default: pubspec.yaml)
  #[serde(default = "default_manifest")]
  pub manifest: PathBuf,

  /// Changelog with `## [X.Y.Z]` headers (default: CHANGELOG.md)
  #[serde(default = "default_changelog")]
  pub changelog: PathBuf,

  /// Git remote to sync with and push to (default: origin)
  #[serde(default = "default_remote")]
  pub remote: String,

  /// Registry page shown in the summary; `{name}` is the package name
  #[serde(default = "default_package_url")]
  pub package_url: Option<String>,
}

fn default_manifest() -> PathBuf {
  PathBuf::from("pubspec.yaml")
}

fn default_changelog() -> PathBuf {
  PathBuf::from("CHANGELOG.md")
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_package_url() -> Option<String> {
  Some("https://pub.dev/packages/{name}".to_string())
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      manifest: default_manifest(),
      changelog: default_changelog(),
      remote: default_remote(),
      package_url: default_package_url(),
    }
  }
}

/// A program the prerequisite check looks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequirement {
  pub name: String,
  /// Install hint shown when the tool is missing
  #[serde(default)]
  pub hint: Option<String>,
}

impl ToolRequirement {
  fn new(name: &str, hint: &str) -> Self {
    Self {
      name: name.to_string(),
      hint: Some(hint.to_string()),
    }
  }
}

fn default_tools() -> Vec<ToolRequirement> {
  vec![
    ToolRequirement::new("flutter", "Install from https://flutter.dev"),
    ToolRequirement::new("git", "Install from https://git-scm.com"),
    ToolRequirement::new("gh", "Install from https://cli.github.com"),
  ]
}

/// Commands run by the quality gates and publish steps, as argv arrays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
  #[serde(default = "default_format")]
  pub format: Vec<String>,

  /// Formatter that only reports, used instead of `format` in dry runs (exit 1 = files would change)
  #[serde(default = "default_format_check")]
  pub format_check: Vec<String>,

  #[serde(default = "default_test")]
  pub test: Vec<String>,

  /// Test gate is skipped when this path doesn't exist (default: test)
  #[serde(default = "default_test_requires_path")]
  pub test_requires_path: Option<PathBuf>,

  #[serde(default = "default_analyze")]
  pub analyze: Vec<String>,

  #[serde(default = "default_docs")]
  pub docs: Vec<String>,

  /// Doc build that writes nothing, used instead of `docs` in dry runs
  #[serde(default = "default_docs_check")]
  pub docs_check: Vec<String>,

  #[serde(default = "default_pre_publish")]
  pub pre_publish: Vec<String>,

  /// Exit codes that count as a passing pre-publish validation (65 = valid with warnings)
  #[serde(default = "default_pre_publish_accepted")]
  pub pre_publish_accepted_exit_codes: Vec<i32>,

  #[serde(default = "default_publish")]
  pub publish: Vec<String>,

  /// Succeeds when the version is already on the registry; publish is skipped then
  #[serde(default)]
  pub publish_check: Option<Vec<String>>,
}

fn argv(parts: &[&str]) -> Vec<String> {
  parts.iter().map(|p| p.to_string()).collect()
}

fn default_format() -> Vec<String> {
  argv(&["dart", "format", "."])
}

fn default_format_check() -> Vec<String> {
  argv(&["dart", "format", "--output=none", "--set-exit-if-changed", "."])
}

fn default_test() -> Vec<String> {
  argv(&["flutter", "test"])
}

fn default_test_requires_path() -> Option<PathBuf> {
  Some(PathBuf::from("test"))
}

fn default_analyze() -> Vec<String> {
  argv(&["flutter", "analyze"])
}

fn default_docs() -> Vec<String> {
  argv(&["dart", "doc"])
}

fn default_docs_check() -> Vec<String> {
  argv(&["dart", "doc", "--dry-run"])
}

fn default_pre_publish() -> Vec<String> {
  argv(&["flutter", "pub", "publish", "--dry-run"])
}

fn default_pre_publish_accepted() -> Vec<i32> {
  vec![0, 65]
}

fn default_publish() -> Vec<String> {
  argv(&["flutter", "pub", "publish", "--force"])
}

impl Default for CommandsConfig {
  fn default() -> Self {
    Self {
      format: default_format(),
      format_check: default_format_check(),
      test: default_test(),
      test_requires_path: default_test_requires_path(),
      analyze: default_analyze(),
      docs: default_docs(),
      docs_check: default_docs_check(),
      pre_publish: default_pre_publish(),
      pre_publish_accepted_exit_codes: default_pre_publish_accepted(),
      publish: default_publish(),
      publish_check: None,
    }
  }
}

/// Code-hosting release CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseToolConfig {
  /// Program invoked as `<program> release view|create` (default: gh)
  #[serde(default = "default_release_program")]
  pub program: String,
}

fn default_release_program() -> String {
  "gh".to_string()
}

impl Default for ReleaseToolConfig {
  fn default() -> Self {
    Self {
      program: default_release_program(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
  /// Step sequence; steps left out never run
  #[serde(default = "default_order")]
  pub order: Vec<StepId>,
}

fn default_order() -> Vec<StepId> {
  StepId::DEFAULT_ORDER.to_vec()
}

impl Default for WorkflowConfig {
  fn default() -> Self {
    Self { order: default_order() }
  }
}

/// Overrides for one step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
  #[serde(default)]
  pub enabled: Option<bool>,
  #[serde(default)]
  pub on_failure: Option<FailurePolicy>,
  /// Platforms the step is skipped on; unset keeps the built-in default
  #[serde(default)]
  pub skip_on: Option<Vec<Platform>>,
}

/// Effective per-step settings after applying defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSettings {
  pub enabled: bool,
  pub on_failure: FailurePolicy,
  pub skip_on: Vec<Platform>,
}

/// What to do when the release's changelog entry has no body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyNotesPolicy {
  /// Ask the operator whether to use the placeholder
  #[default]
  Prompt,
  /// Use the placeholder without asking (with a warning)
  Placeholder,
  /// Fail validation
  Fail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangelogConfig {
  #[serde(default)]
  pub empty_notes: EmptyNotesPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
  /// Environment variable that overrides the release tool's stored login
  #[serde(default = "default_credential_env")]
  pub env: Option<String>,
}

fn default_credential_env() -> Option<String> {
  Some("GITHUB_TOKEN".to_string())
}

impl Default for CredentialsConfig {
  fn default() -> Self {
    Self {
      env: default_credential_env(),
    }
  }
}

impl Default for ShipConfig {
  fn default() -> Self {
    Self {
      project: ProjectConfig::default(),
      tools: default_tools(),
      commands: CommandsConfig::default(),
      release: ReleaseToolConfig::default(),
      workflow: WorkflowConfig::default(),
      steps: BTreeMap::new(),
      changelog: ChangelogConfig::default(),
      credentials: CredentialsConfig::default(),
    }
  }
}

impl ShipConfig {
  /// Find config file in search order: shiprail.toml, .shiprail.toml, .config/shiprail.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join(CONFIG_FILE_NAME),
      path.join(".shiprail.toml"),
      path.join(".config").join(CONFIG_FILE_NAME),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config for the project at `root`
  ///
  /// An explicit path must exist. Without one, the search locations are tried
  /// and the defaults are used when none exists.
  pub fn load(root: &Path, explicit: Option<&Path>) -> ShipResult<Self> {
    let config_path = match explicit {
      Some(path) => {
        let path = if path.is_absolute() { path.to_path_buf() } else { root.join(path) };
        if !path.exists() {
          return Err(ShipError::Config(ConfigError::NotFound { path }));
        }
        path
      }
      None => match Self::find_config_path(root) {
        Some(path) => path,
        None => {
          tracing::debug!(root = %root.display(), "no shiprail.toml found, using defaults");
          return Ok(Self::default());
        }
      },
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "loaded configuration");
    Ok(config)
  }

  /// Parse and validate config text
  pub fn parse(content: &str) -> ShipResult<Self> {
    let config: ShipConfig = toml_edit::de::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Save config to shiprail.toml in `root`
  pub fn save(&self, root: &Path) -> ShipResult<PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(config_path)
  }

  /// Defaults as written by `shiprail init`, with the built-in step overrides spelled out
  pub fn init_template() -> Self {
    let mut config = Self::default();
    config.steps.insert(
      StepId::PrePublishValidate.to_string(),
      StepConfig {
        enabled: Some(true),
        on_failure: Some(FailurePolicy::Fatal),
        skip_on: Some(vec![Platform::Windows]),
      },
    );
    config
  }

  /// Effective settings for a step
  pub fn step_settings(&self, id: StepId) -> StepSettings {
    let overrides = self.steps.get(id.as_str()).cloned().unwrap_or_default();
    StepSettings {
      enabled: overrides.enabled.unwrap_or(true),
      on_failure: overrides.on_failure.unwrap_or_default(),
      skip_on: overrides.skip_on.unwrap_or_else(|| default_skip_on(id)),
    }
  }

  /// Validate the configuration
  pub fn validate(&self) -> ShipResult<()> {
    if self.project.remote.trim().is_empty() {
      return Err(invalid("project.remote", "must not be empty"));
    }

    if self.release.program.trim().is_empty() {
      return Err(invalid("release.program", "must not be empty"));
    }

    for (field, command) in [
      ("commands.format", &self.commands.format),
      ("commands.test", &self.commands.test),
      ("commands.analyze", &self.commands.analyze),
      ("commands.docs", &self.commands.docs),
      ("commands.format_check", &self.commands.format_check),
      ("commands.docs_check", &self.commands.docs_check),
      ("commands.pre_publish", &self.commands.pre_publish),
      ("commands.publish", &self.commands.publish),
    ] {
      if command.is_empty() {
        return Err(invalid(field, "command must name a program"));
      }
    }
    if let Some(check) = &self.commands.publish_check
      && check.is_empty()
    {
      return Err(invalid("commands.publish_check", "command must name a program"));
    }

    if self.commands.pre_publish_accepted_exit_codes.is_empty() {
      return Err(invalid("commands.pre_publish_accepted_exit_codes", "must list at least one code"));
    }

    if self.tools.iter().any(|t| t.name.trim().is_empty()) {
      return Err(invalid("tools", "every tool needs a name"));
    }

    for (key, step) in &self.steps {
      let id = key
        .parse::<StepId>()
        .map_err(|reason: String| invalid(&format!("steps.{}", key), &reason))?;

      if id.mutates() && step.skip_on.as_ref().is_some_and(|p| !p.is_empty()) {
        return Err(invalid(
          &format!("steps.{}.skip_on", key),
          "steps that publish, commit, tag or release cannot be skipped by platform",
        ));
      }
      if id == StepId::ValidateChangelog && step.enabled == Some(false) {
        return Err(invalid(
          "steps.validate-changelog.enabled",
          "changelog validation cannot be disabled",
        ));
      }
    }

    validate_order(&self.workflow.order)
  }
}

fn default_skip_on(id: StepId) -> Vec<Platform> {
  match id {
    // `flutter pub publish --dry-run` trips over a `nul` path on Windows
    StepId::PrePublishValidate => vec![Platform::Windows],
    _ => Vec::new(),
  }
}

fn invalid(field: &str, reason: &str) -> ShipError {
  ShipError::Config(ConfigError::Invalid {
    field: field.to_string(),
    reason: reason.to_string(),
  })
}

/// Check the configured sequence against the workflow invariants
///
/// No step may appear twice, and every mutating step must come after both
/// `validate-changelog` and `confirm`.
pub fn validate_order(order: &[StepId]) -> ShipResult<()> {
  let order_error = |reason: String| ShipError::Config(ConfigError::InvalidOrder { reason });

  let mut seen = HashSet::new();
  for id in order {
    if !seen.insert(*id) {
      return Err(order_error(format!("'{}' appears more than once", id)));
    }
  }

  let position = |target: StepId| order.iter().position(|id| *id == target);
  let first_mutating = match order.iter().position(|id| id.mutates()) {
    Some(index) => index,
    None => return Ok(()),
  };
  let mutating = order[first_mutating];

  for guard in [StepId::ValidateChangelog, StepId::Confirm] {
    match position(guard) {
      None => {
        return Err(order_error(format!("'{}' is required before '{}'", guard, mutating)));
      }
      Some(index) if index > first_mutating => {
        return Err(order_error(format!("'{}' must come before '{}'", guard, mutating)));
      }
      Some(_) => {}
    }
  }

  Ok(())
}
