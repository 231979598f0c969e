//! Working tree and remote divergence checks
//!
//! State is recomputed on every call; nothing is cached between steps.

use super::git::Git;
use crate::core::error::{ShipError, ShipResult};
use serde::Serialize;
use tracing::{debug, warn};

/// Branch assumed when the current one can't be determined
pub const FALLBACK_BRANCH: &str = "main";

/// Snapshot of the repository relative to its remote
///
/// `check_clean` fills the cleanliness fields and `check_remote_sync` the
/// divergence fields; the others keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryState {
  pub is_clean: bool,
  /// `git status --porcelain` lines, empty when clean
  pub dirty_diff_summary: String,
  pub ahead_count: u64,
  pub behind_count: u64,
  pub fetch_succeeded: bool,
}

impl Default for RepositoryState {
  fn default() -> Self {
    Self {
      is_clean: true,
      dirty_diff_summary: String::new(),
      ahead_count: 0,
      behind_count: 0,
      fetch_succeeded: true,
    }
  }
}

impl RepositoryState {
  /// Fail when the local branch is missing remote commits
  ///
  /// Being ahead is fine (those commits ship with the release). A failed fetch
  /// means the counts are unknown and is not an error.
  pub fn ensure_not_behind(&self, remote: &str, branch: &str) -> ShipResult<()> {
    if self.fetch_succeeded && self.behind_count > 0 {
      return Err(ShipError::RepoBehindRemote {
        remote: remote.to_string(),
        branch: branch.to_string(),
        behind: self.behind_count,
      });
    }
    Ok(())
  }
}

/// Report whether the working tree has uncommitted changes
pub fn check_clean(git: &Git<'_>) -> ShipResult<RepositoryState> {
  let porcelain = git.status_porcelain()?;
  Ok(RepositoryState {
    is_clean: porcelain.trim().is_empty(),
    dirty_diff_summary: porcelain,
    ..RepositoryState::default()
  })
}

/// Fetch `branch` and count commits on each side
///
/// A fetch failure (offline, branch not yet pushed) yields
/// `fetch_succeeded = false` with zero counts.
pub fn check_remote_sync(git: &Git<'_>, branch: &str) -> ShipResult<RepositoryState> {
  if !git.fetch(branch)? {
    warn!(remote = git.remote(), branch, "fetch failed, skipping divergence check");
    return Ok(RepositoryState {
      fetch_succeeded: false,
      ..RepositoryState::default()
    });
  }

  let tracking = format!("{}/{}", git.remote(), branch);
  let behind = git.count_commits(&format!("HEAD..{}", tracking))?.unwrap_or(0);
  let ahead = git.count_commits(&format!("{}..HEAD", tracking))?.unwrap_or(0);
  debug!(%tracking, ahead, behind, "remote divergence");

  Ok(RepositoryState {
    ahead_count: ahead,
    behind_count: behind,
    ..RepositoryState::default()
  })
}

/// Current branch, or `main` when detached or undetectable
pub fn current_branch(git: &Git<'_>) -> String {
  match git.current_branch() {
    Ok(Some(branch)) => branch,
    Ok(None) => FALLBACK_BRANCH.to_string(),
    Err(err) => {
      debug!(error = %err, "could not determine current branch");
      FALLBACK_BRANCH.to_string()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::ErrorKind;
  use crate::gateway::ToolOutput;
  use crate::gateway::fake::FakeGateway;
  use std::path::Path;

  fn git(fake: &FakeGateway) -> Git<'_> {
    Git::new(fake, Path::new("."), "origin")
  }

  #[test]
  fn test_clean_tree() {
    let fake = FakeGateway::new();
    let state = check_clean(&git(&fake)).unwrap();
    assert!(state.is_clean);
    assert!(state.dirty_diff_summary.is_empty());
  }

  #[test]
  fn test_dirty_tree_is_reported_not_fatal() {
    let fake = FakeGateway::new();
    fake.on("git status --porcelain", ToolOutput::ok(" M lib/src.dart\n?? notes.txt\n"));
    let state = check_clean(&git(&fake)).unwrap();
    assert!(!state.is_clean);
    assert_eq!(state.dirty_diff_summary, " M lib/src.dart\n?? notes.txt");
  }

  #[test]
  fn test_fetch_failure_degrades() {
    let fake = FakeGateway::new();
    fake.on("git fetch", ToolOutput::failed(128, "fatal: couldn't find remote ref main"));
    let state = check_remote_sync(&git(&fake), "main").unwrap();
    assert!(!state.fetch_succeeded);
    assert!(state.ensure_not_behind("origin", "main").is_ok());
    assert_eq!(fake.count("git rev-list"), 0);
  }

  #[test]
  fn test_behind_is_fatal() {
    let fake = FakeGateway::new();
    fake.on("git rev-list --count HEAD..origin/main", ToolOutput::ok("3\n"));
    let state = check_remote_sync(&git(&fake), "main").unwrap();
    assert_eq!(state.behind_count, 3);
    let err = state.ensure_not_behind("origin", "main").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RepoBehindRemote);
  }

  #[test]
  fn test_ahead_only_is_fine() {
    let fake = FakeGateway::new();
    fake.on("git rev-list --count HEAD..origin/main", ToolOutput::ok("0\n"));
    fake.on("git rev-list --count origin/main..HEAD", ToolOutput::ok("2\n"));
    let state = check_remote_sync(&git(&fake), "main").unwrap();
    assert_eq!(state.ahead_count, 2);
    assert!(state.ensure_not_behind("origin", "main").is_ok());
  }

  #[test]
  fn test_branch_fallback() {
    let fake = FakeGateway::new();
    fake.on("git rev-parse", ToolOutput::failed(128, "fatal: not a git repository"));
    assert_eq!(current_branch(&git(&fake)), "main");

    let fake = FakeGateway::new();
    fake.on("git rev-parse --abbrev-ref HEAD", ToolOutput::ok("release/2.x\n"));
    assert_eq!(current_branch(&git(&fake)), "release/2.x");
  }
}
