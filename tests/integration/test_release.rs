//! End-to-end release runs

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_dry_run_mutates_nothing() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;

  let output = shiprail(&project.path, &["--dry-run"])?;
  assert_exit(&output, 0);

  let out = stdout(&output);
  assert!(out.contains("Releasing demo_pkg 1.0.0 from main"));
  assert!(out.contains("would: Create tag v1.0.0"));
  assert!(out.contains("Dry run complete"));
  assert!(project.remote_tags()?.is_empty());
  assert_eq!(project.remote_head_subject()?, "Initial package");
  Ok(())
}

#[test]
fn test_release_tags_and_pushes_then_skips_on_rerun() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;
  project.write_file("NOTES.md", "release prep\n")?;

  let first = shiprail(&project.path, &["--yes"])?;
  assert_exit(&first, 0);
  assert!(stdout(&first).contains("Release complete"));
  assert_eq!(project.remote_tags()?, vec!["v1.0.0"]);
  assert_eq!(project.remote_head_subject()?, "Release v1.0.0");

  let second = shiprail(&project.path, &["--yes", "--json"])?;
  assert_exit(&second, 0);
  let trace: serde_json::Value = serde_json::from_str(&stdout(&second))?;
  let tag_step = trace["records"]
    .as_array()
    .and_then(|records| records.iter().find(|r| r["step"] == "create-tag"))
    .cloned()
    .unwrap_or_default();
  assert_eq!(tag_step["outcome"]["status"], "skipped");
  assert_eq!(tag_step["outcome"]["reason"], "already-satisfied");
  assert_eq!(project.remote_tags()?, vec!["v1.0.0"]);
  Ok(())
}

#[test]
fn test_version_mismatch_exits_5() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.1.0")?;

  let output = shiprail(&project.path, &["--yes"])?;
  assert_exit(&output, 5);
  let out = stdout(&output);
  assert!(out.contains("Validating changelog failed"));
  // Fail-fast: nothing after validation ran
  assert!(!out.contains("Generating documentation"));
  assert!(project.remote_tags()?.is_empty());
  Ok(())
}

#[test]
fn test_version_override_bypasses_build_suffix() -> Result<()> {
  let project = TestProject::new("1.1.0+3", "1.1.0")?;

  let output = shiprail(&project.path, &["--dry-run"])?;
  assert_exit(&output, 5);

  let output = shiprail(&project.path, &["--dry-run", "--version", "1.1.0"])?;
  assert_exit(&output, 0);
  assert!(stdout(&output).contains("would: Create tag v1.1.0"));
  Ok(())
}

#[test]
fn test_version_override_cannot_contradict_manifest() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.1.0")?;

  let output = shiprail(&project.path, &["--dry-run", "--version", "1.1.0"])?;
  assert_exit(&output, 5);
  assert!(stdout(&output).contains("--version is 1.1.0, but the manifest declares 1.0.0"));
  Ok(())
}

#[test]
fn test_behind_remote_exits_2() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;
  project.advance_remote()?;

  let output = shiprail(&project.path, &["--yes"])?;
  assert_exit(&output, 2);
  assert!(stdout(&output).contains("git pull"));
  assert!(project.remote_tags()?.is_empty());
  Ok(())
}

#[test]
fn test_dirty_tree_declined_exits_10() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;
  project.write_file("NOTES.md", "uncommitted\n")?;

  // Stdin is closed, so the prompt is declined
  let output = shiprail(&project.path, &[])?;
  assert_exit(&output, 10);
  assert!(project.remote_tags()?.is_empty());
  Ok(())
}

#[test]
fn test_missing_tool_exits_1() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;
  let config = project.read_file("shiprail.toml")?.replace(
    "[[tools]]\nname = \"git\"",
    "[[tools]]\nname = \"shiprail-no-such-tool\"\nhint = \"Install it\"\n\n[[tools]]\nname = \"git\"",
  );
  project.write_file("shiprail.toml", &config)?;
  git(&project.path, &["commit", "-am", "Require a missing tool"])?;

  let output = shiprail(&project.path, &["--dry-run"])?;
  assert_exit(&output, 1);
  assert!(stdout(&output).contains("shiprail-no-such-tool"));
  Ok(())
}
