use super::{release_target, run_configured};
use crate::core::error::{ReleaseError, ResultExt, ShipError, ShipResult};
use crate::gateway::ToolCommand;
use std::io::Write;
use tempfile::TempPath;
use crate::workflow::context::RunContext;
use crate::workflow::outcome::{ActionRecord, StepReport};
use crate::workflow::step::{Step, StepId};

/// Credential variable named in remediation when none is configured
const DEFAULT_CREDENTIAL_ENV: &str = "GITHUB_TOKEN";

/// Code-hosting release for the tag, with the changelog notes as body
pub struct CreateRelease;

impl Step for CreateRelease {
  fn id(&self) -> StepId {
    StepId::CreateRelease
  }

  fn is_satisfied(&self, ctx: &RunContext<'_>) -> ShipResult<Option<String>> {
    let tag = release_target(ctx, self.id())?.tag();
    let view = ToolCommand::new(&ctx.config.release.program).args(["release", "view", tag.as_str()]);
    let output = run_configured(ctx, &view)?;
    Ok(output.success().then(|| format!("release {} already exists", tag)))
  }

  fn describe(&self, ctx: &RunContext<'_>) -> ShipResult<Vec<String>> {
    let tag = release_target(ctx, self.id())?.tag();
    Ok(vec![format!("Create release {} titled \"Release {}\"", tag, tag)])
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let target = release_target(ctx, self.id())?;
    let tag = target.tag();
    let title = format!("Release {}", tag);
    let notes_file = write_notes_file(&target.notes)?;
    let create = ToolCommand::new(&ctx.config.release.program)
      .args(["release", "create", tag.as_str(), "--title", title.as_str(), "--notes-file"])
      .arg(notes_file.to_string_lossy());

    let output = run_configured(ctx, &create)?;
    if !output.success() {
      let combined = output.combined();
      let error = if is_auth_failure(&combined) {
        ReleaseError::Authentication {
          tag,
          output: combined,
          credential_env: ctx
            .config
            .credentials
            .env
            .clone()
            .unwrap_or_else(|| DEFAULT_CREDENTIAL_ENV.to_string()),
        }
      } else {
        ReleaseError::Failed {
          tag,
          exit_code: output.exit_code,
          output: combined,
        }
      };
      return Err(ShipError::Release(error));
    }

    Ok(StepReport::done().action(ActionRecord::done(format!("Create release {}", tag))))
  }
}

/// Notes go through a file so multi-line Markdown survives any shell in between
fn write_notes_file(notes: &str) -> ShipResult<TempPath> {
  let mut file = tempfile::Builder::new()
    .prefix("shiprail-notes-")
    .suffix(".md")
    .tempfile()
    .context("Failed to create release notes file")?;
  file
    .write_all(notes.as_bytes())
    .and_then(|()| file.flush())
    .context("Failed to write release notes file")?;
  Ok(file.into_temp_path())
}

/// Known signatures of rejected credentials in release tool output
pub fn is_auth_failure(output: &str) -> bool {
  output.contains("401") || output.contains("Bad credentials") || output.to_lowercase().contains("authentication")
}

#[cfg(test)]
mod tests {
  use super::super::testing;
  use super::*;
  use crate::core::config::ShipConfig;
  use crate::core::error::ErrorKind;
  use crate::gateway::ToolOutput;
  use crate::gateway::fake::FakeGateway;
  use crate::ui::prompt::scripted::ScriptedOperator;
  use crate::workflow::context::RunOptions;
  use std::fs;

  #[test]
  fn test_auth_signatures() {
    assert!(is_auth_failure("HTTP 401: Bad credentials (https://api.github.com/graphql)"));
    assert!(is_auth_failure("error: Bad credentials"));
    assert!(is_auth_failure("gh: Authentication required"));
    assert!(!is_auth_failure("release already exists"));
  }

  #[test]
  fn test_auth_failure_names_configured_variable() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ShipConfig::default();
    config.credentials.env = Some("GH_TOKEN".to_string());
    let options = RunOptions::default();
    let fake = FakeGateway::new();
    fake.on("gh release create", ToolOutput::failed(1, "HTTP 401: Bad credentials"));
    let operator = ScriptedOperator::default();
    let mut ctx = testing::context(dir.path(), &config, &options, &fake, &operator);
    ctx.state.release = Some(testing::target());

    let err = CreateRelease.run(&mut ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    assert!(err.help_message().unwrap().contains("unset GH_TOKEN"));
  }

  #[test]
  fn test_generic_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = ShipConfig::default();
    let options = RunOptions::default();
    let fake = FakeGateway::new();
    fake.on("gh release create", ToolOutput::failed(1, "tag not found on remote"));
    let operator = ScriptedOperator::default();
    let mut ctx = testing::context(dir.path(), &config, &options, &fake, &operator);
    ctx.state.release = Some(testing::target());

    let err = CreateRelease.run(&mut ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReleaseCreationFailure);
  }

  #[test]
  fn test_release_passes_notes() {
    let dir = tempfile::tempdir().unwrap();
    let config = ShipConfig::default();
    let options = RunOptions::default();
    let fake = FakeGateway::new();
    let operator = ScriptedOperator::default();
    let mut ctx = testing::context(dir.path(), &config, &options, &fake, &operator);
    ctx.state.release = Some(testing::target());

    CreateRelease.run(&mut ctx).unwrap();
    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("gh release create v1.2.0 --title \"Release v1.2.0\" --notes-file "));
    assert!(!calls[0].contains("fix bug"));
  }

  #[test]
  fn test_notes_file_keeps_markdown_intact() {
    let notes = "- a & b\n- c > out | d ^ e\n";
    let path = write_notes_file(notes).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), notes);
    let kept = path.to_path_buf();
    drop(path);
    assert!(!kept.exists());
  }
}
