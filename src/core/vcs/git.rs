//! Git operations over the tool gateway
//!
//! Every call is a `git` subprocess run through [`ToolGateway`], so tests can
//! script repository state without a real repository.

use crate::core::error::{GitError, ShipError, ShipResult};
use crate::gateway::{ToolCommand, ToolGateway, ToolOutput};
use std::path::Path;

/// Git handle for one working tree and remote
pub struct Git<'a> {
  gateway: &'a dyn ToolGateway,
  work_tree: &'a Path,
  remote: &'a str,
}

impl<'a> Git<'a> {
  pub fn new(gateway: &'a dyn ToolGateway, work_tree: &'a Path, remote: &'a str) -> Self {
    Self {
      gateway,
      work_tree,
      remote,
    }
  }

  pub fn remote(&self) -> &str {
    self.remote
  }

  /// Run git and return the raw output, whatever the exit status
  pub fn run(&self, args: &[&str]) -> ShipResult<ToolOutput> {
    let command = ToolCommand::new("git").args(args.iter().copied());
    self.gateway.invoke(&command, self.work_tree)
  }

  /// Run git and fail with `CommandFailed` on a non-zero exit
  fn run_checked(&self, args: &[&str]) -> ShipResult<String> {
    let output = self.run(args)?;
    if !output.success() {
      return Err(ShipError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: output.combined(),
      }));
    }
    Ok(output.stdout)
  }

  /// `git status --porcelain` output, empty when the tree is clean
  pub fn status_porcelain(&self) -> ShipResult<String> {
    Ok(self.run_checked(&["status", "--porcelain"])?.trim_end().to_string())
  }

  /// Fetch one branch from the remote; returns whether it succeeded
  pub fn fetch(&self, branch: &str) -> ShipResult<bool> {
    Ok(self.run(&["fetch", self.remote, branch])?.success())
  }

  /// Count commits in `range` (`A..B`); `None` when git can't resolve it
  pub fn count_commits(&self, range: &str) -> ShipResult<Option<u64>> {
    let output = self.run(&["rev-list", "--count", range])?;
    if !output.success() {
      return Ok(None);
    }
    Ok(output.stdout.trim().parse().ok())
  }

  /// Current branch name; `None` when detached or undetectable
  pub fn current_branch(&self) -> ShipResult<Option<String>> {
    let output = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    let name = output.stdout.trim();
    if !output.success() || name.is_empty() || name == "HEAD" {
      return Ok(None);
    }
    Ok(Some(name.to_string()))
  }

  /// URL of the configured remote
  pub fn remote_url(&self) -> ShipResult<Option<String>> {
    let output = self.run(&["remote", "get-url", self.remote])?;
    let url = output.stdout.trim();
    if !output.success() || url.is_empty() {
      return Ok(None);
    }
    Ok(Some(url.to_string()))
  }

  pub fn local_tag_exists(&self, tag: &str) -> ShipResult<bool> {
    let listed = self.run_checked(&["tag", "-l", tag])?;
    Ok(listed.lines().any(|line| line.trim() == tag))
  }

  pub fn remote_tag_exists(&self, tag: &str) -> ShipResult<bool> {
    let refname = format!("refs/tags/{}", tag);
    let listed = self.run_checked(&["ls-remote", "--tags", self.remote, &refname])?;
    Ok(!listed.trim().is_empty())
  }

  pub fn remote_branch_exists(&self, branch: &str) -> ShipResult<bool> {
    let refname = format!("refs/heads/{}", branch);
    let listed = self.run_checked(&["ls-remote", "--heads", self.remote, &refname])?;
    Ok(!listed.trim().is_empty())
  }

  /// Create an annotated tag at HEAD
  pub fn create_tag(&self, tag: &str, message: &str) -> ShipResult<()> {
    self.run_checked(&["tag", "-a", tag, "-m", message])?;
    Ok(())
  }

  /// Stage everything and commit
  pub fn commit_all(&self, message: &str) -> ShipResult<()> {
    self.run_checked(&["add", "-A"])?;
    self.run_checked(&["commit", "-m", message])?;
    Ok(())
  }

  /// Push a branch or tag to the remote
  pub fn push(&self, refspec: &str) -> ShipResult<()> {
    let output = self.run(&["push", self.remote, refspec])?;
    if !output.success() {
      return Err(ShipError::Git(GitError::PushFailed {
        remote: self.remote.to_string(),
        refspec: refspec.to_string(),
        reason: output.combined(),
      }));
    }
    Ok(())
  }

  /// Commit log between two dates, one `<sha> <subject>` line per commit followed by the body
  pub fn log_between(&self, since: &str, until: &str) -> ShipResult<String> {
    let since = format!("--since={}", since);
    let until = format!("--until={}", until);
    self.run_checked(&["log", &since, &until, "--pretty=format:%H %s%n%b"])
  }
}

/// `owner/repo` from a GitHub remote URL (https or ssh form)
pub fn github_repo_path(remote_url: &str) -> Option<String> {
  let url = remote_url.trim();
  let start = url.find("github.com")? + "github.com".len();
  let rest = url[start..].strip_prefix([':', '/'])?;
  let path = rest.strip_suffix(".git").unwrap_or(rest).trim_end_matches('/');
  (!path.is_empty()).then(|| path.to_string())
}
