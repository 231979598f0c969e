//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Config that runs every gate as a harmless git invocation
///
/// The release tool is disabled: there is no code host to talk to.
const TEST_CONFIG: &str = r#"[project]
remote = "origin"

[[tools]]
name = "git"
hint = "Install git"

[commands]
format = ["git", "--version"]
format_check = ["git", "--version"]
test = ["git", "--version"]
analyze = ["git", "--version"]
docs = ["git", "--version"]
docs_check = ["git", "--version"]
pre_publish = ["git", "--version"]
publish = ["git", "--version"]

[steps.create-release]
enabled = false

[credentials]
env = "SHIPRAIL_TEST_UNSET_TOKEN"
"#;

/// A package repository with a bare `origin` it is in sync with
pub struct TestProject {
  _root: TempDir,
  pub path: PathBuf,
  pub remote: PathBuf,
}

impl TestProject {
  /// Package `demo_pkg` at `version` with a changelog whose latest entry is `changelog_version`
  pub fn new(version: &str, changelog_version: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("demo_pkg");
    let remote = root.path().join("remote.git");
    std::fs::create_dir_all(&path)?;

    git(root.path(), &["init", "--bare", "--initial-branch=main", "remote.git"])?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;
    git(&path, &["config", "tag.gpgsign", "false"])?;

    std::fs::write(
      path.join("pubspec.yaml"),
      format!("name: demo_pkg\nversion: {}\n\ndependencies:\n  http:\n    version: ^1.0.0\n", version),
    )?;
    std::fs::write(
      path.join("CHANGELOG.md"),
      format!(
        "# Changelog\n\n## [{}] - 2025-01-15\n- Fixed the widget\n\n## [0.9.0]\n- First release\n",
        changelog_version
      ),
    )?;
    std::fs::write(path.join("shiprail.toml"), TEST_CONFIG)?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial package"])?;
    git(&path, &["remote", "add", "origin", &remote.to_string_lossy()])?;
    git(&path, &["push", "-u", "origin", "main"])?;

    Ok(Self { _root: root, path, remote })
  }

  /// Write a file without committing it
  pub fn write_file(&self, name: &str, content: &str) -> Result<()> {
    std::fs::write(self.path.join(name), content)?;
    Ok(())
  }

  pub fn read_file(&self, name: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(name))?)
  }

  pub fn file_exists(&self, name: &str) -> bool {
    self.path.join(name).exists()
  }

  /// Tags present on the bare remote
  pub fn remote_tags(&self) -> Result<Vec<String>> {
    let output = git(&self.remote, &["tag", "-l"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Subject of the remote's latest commit on main
  pub fn remote_head_subject(&self) -> Result<String> {
    let output = git(&self.remote, &["log", "-1", "--format=%s", "main"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Push a commit to the remote from a separate clone, leaving this project behind
  pub fn advance_remote(&self) -> Result<()> {
    let clone = self.path.with_file_name("other_clone");
    git(
      self.path.parent().context("project has a parent")?,
      &["clone", &self.remote.to_string_lossy(), "other_clone"],
    )?;
    git(&clone, &["config", "user.name", "Other User"])?;
    git(&clone, &["config", "user.email", "other@example.com"])?;
    std::fs::write(clone.join("NOTES.md"), "from elsewhere\n")?;
    git(&clone, &["add", "."])?;
    git(&clone, &["commit", "-m", "Remote-only change"])?;
    git(&clone, &["push", "origin", "main"])?;
    Ok(())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the shiprail binary; non-zero exits are returned, not errors
///
/// Stdin is closed, so any confirmation prompt reads end of input and declines.
pub fn shiprail(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_shiprail");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env("NO_COLOR", "1")
    .env_remove("SHIPRAIL_LOG")
    .stdin(Stdio::null())
    .output()
    .context("Failed to run shiprail")
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}

/// Assert the exit code, showing both streams on mismatch
pub fn assert_exit(output: &Output, expected: i32) {
  assert_eq!(
    output.status.code(),
    Some(expected),
    "unexpected exit\nstdout:\n{}\nstderr:\n{}",
    stdout(output),
    stderr(output)
  );
}
