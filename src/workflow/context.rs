//! Per-run state shared by all steps

use crate::core::config::ShipConfig;
use crate::core::vcs::Git;
use crate::gateway::ToolGateway;
use crate::release::version::Version;
use crate::ui::prompt::Operator;
use std::path::{Path, PathBuf};

/// Command-line switches for one run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  /// Validate everything, mutate nothing
  pub dry_run: bool,
  /// Release this version instead of the manifest's
  pub version: Option<Version>,
  /// Branch to sync and push instead of the current one
  pub branch: Option<String>,
}

/// Release target established by changelog validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTarget {
  pub package: String,
  pub version: Version,
  /// Notes from the changelog, or the placeholder
  pub notes: String,
}

impl ReleaseTarget {
  pub fn tag(&self) -> String {
    self.version.tag_name()
  }
}

/// Facts gathered while the run progresses
#[derive(Debug, Clone, Default)]
pub struct RunState {
  /// Set by `validate-changelog`; mutating steps refuse to run without it
  pub release: Option<ReleaseTarget>,
}

/// Everything a step can see
pub struct RunContext<'a> {
  pub root: &'a Path,
  pub config: &'a ShipConfig,
  pub options: &'a RunOptions,
  pub gateway: &'a dyn ToolGateway,
  pub operator: &'a dyn Operator,
  /// Branch being released (override, current branch, or `main`)
  pub branch: String,
  pub state: RunState,
}

impl<'a> RunContext<'a> {
  pub fn git(&self) -> Git<'a> {
    Git::new(self.gateway, self.root, &self.config.project.remote)
  }

  /// Project-relative path resolved against the root
  pub fn project_path(&self, relative: &Path) -> PathBuf {
    self.root.join(relative)
  }
}
