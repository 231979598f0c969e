//! Project context - build once, pass everywhere
//!
//! ```text
//! main.rs:
//!   ProjectContext::build() -> &ProjectContext
//!   |
//!   v
//! commands/release.rs, plan.rs, notes.rs, history.rs:
//!   fn run_*(ctx: &ProjectContext, ...)
//! ```
//!
//! `init` is the exception: it runs before a configuration exists and only
//! needs the root.

use crate::core::config::ShipConfig;
use crate::core::error::{ResultExt, ShipResult};
use std::path::{Path, PathBuf};

/// Project root plus its loaded configuration
#[derive(Debug, Clone)]
pub struct ProjectContext {
  /// Project root (absolute path); all configured paths resolve against it
  pub root: PathBuf,

  /// Loaded `shiprail.toml`, or the built-in defaults when the file is absent
  pub config: ShipConfig,
}

impl ProjectContext {
  /// Resolve the root and load configuration
  ///
  /// An explicit `--config` path must exist; otherwise a missing file falls
  /// back to defaults.
  pub fn build(root: &Path, config_path: Option<&Path>) -> ShipResult<Self> {
    let root = root
      .canonicalize()
      .with_context(|| format!("Failed to resolve project directory {}", root.display()))?;
    let config = ShipConfig::load(&root, config_path)?;
    Ok(Self { root, config })
  }

  /// Absolute path of a project-relative file
  pub fn path(&self, relative: &Path) -> PathBuf {
    self.root.join(relative)
  }
}
