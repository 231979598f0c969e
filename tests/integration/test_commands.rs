//! Tests for the auxiliary commands: plan, notes, init, history

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_plan_lists_steps() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;

  let output = shiprail(&project.path, &["plan"])?;
  assert_exit(&output, 0);
  let out = stdout(&output);
  assert!(out.contains("Release plan"));
  assert!(out.contains("tag v1.0.0"));
  assert!(out.contains("validate-changelog"));
  assert!(out.contains("create-release"));
  Ok(())
}

#[test]
fn test_plan_json_is_stable() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;

  let first: serde_json::Value = serde_json::from_str(&stdout(&shiprail(&project.path, &["plan", "--json"])?))?;
  let second: serde_json::Value = serde_json::from_str(&stdout(&shiprail(&project.path, &["plan", "--json"])?))?;
  assert_eq!(first["id"], second["id"]);
  assert_eq!(first["version"], "1.0.0");
  assert_eq!(first["steps"].as_array().map(Vec::len), Some(14));

  let bumped: serde_json::Value = serde_json::from_str(&stdout(&shiprail(
    &project.path,
    &["plan", "--json", "--version", "1.0.1"],
  )?))?;
  assert_ne!(first["id"], bumped["id"]);
  Ok(())
}

#[test]
fn test_notes_latest_and_specific() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;

  let latest = shiprail(&project.path, &["notes"])?;
  assert_exit(&latest, 0);
  assert_eq!(stdout(&latest).trim(), "- Fixed the widget");

  let older = shiprail(&project.path, &["notes", "0.9.0"])?;
  assert_eq!(stdout(&older).trim(), "- First release");

  let missing = shiprail(&project.path, &["notes", "3.0.0"])?;
  assert_exit(&missing, 5);
  Ok(())
}

#[test]
fn test_init_creates_config_once() -> Result<()> {
  let temp = tempfile::TempDir::new()?;

  let output = shiprail(temp.path(), &["init"])?;
  assert_exit(&output, 0);
  let config = std::fs::read_to_string(temp.path().join("shiprail.toml"))?;
  assert!(config.contains("[project]"));
  assert!(config.contains("pre-publish-validate"));

  let again = shiprail(temp.path(), &["init"])?;
  assert_exit(&again, 1);
  assert!(stderr(&again).contains("--force"));

  assert_exit(&shiprail(temp.path(), &["init", "--force"])?, 0);
  Ok(())
}

#[test]
fn test_history_writes_commit_log() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;

  let output = shiprail(&project.path, &["history", "--output", "log.txt"])?;
  assert_exit(&output, 0);
  assert!(project.file_exists("log.txt"));
  assert!(project.read_file("log.txt")?.contains("Initial package"));

  let empty = shiprail(
    &project.path,
    &["history", "--since", "2000-01-01", "--until", "2000-01-02", "-o", "old.txt"],
  )?;
  assert_exit(&empty, 0);
  assert!(stdout(&empty).contains("No commits found"));
  Ok(())
}

#[test]
fn test_explicit_missing_config_fails() -> Result<()> {
  let project = TestProject::new("1.0.0", "1.0.0")?;

  let output = shiprail(&project.path, &["plan", "--config", "nope.toml"])?;
  assert_exit(&output, 1);
  assert!(stderr(&output).contains("nope.toml"));
  Ok(())
}
