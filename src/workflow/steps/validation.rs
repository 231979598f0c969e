use super::{configured_command, run_configured};
use crate::core::error::{ShipError, ShipResult};
use crate::workflow::context::RunContext;
use crate::workflow::outcome::StepReport;
use crate::workflow::step::{Step, StepId};

/// Doc build; dry runs use `commands.docs_check` so no output is written
pub struct GenerateDocs;

impl Step for GenerateDocs {
  fn id(&self) -> StepId {
    StepId::GenerateDocs
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let commands = &ctx.config.commands;
    let (field, argv) = if ctx.options.dry_run {
      ("commands.docs_check", &commands.docs_check)
    } else {
      ("commands.docs", &commands.docs)
    };
    let command = configured_command(field, argv, ctx.state.release.as_ref())?;
    let output = run_configured(ctx, &command)?;
    if !output.success() {
      return Err(ShipError::DocGeneration {
        exit_code: output.exit_code,
        output: output.combined(),
      });
    }
    Ok(StepReport::done().info("Documentation generated"))
  }
}

/// Registry dry run; some non-zero codes mean "valid with warnings"
pub struct PrePublishValidate;

impl Step for PrePublishValidate {
  fn id(&self) -> StepId {
    StepId::PrePublishValidate
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let commands = &ctx.config.commands;
    let command = configured_command("commands.pre_publish", &commands.pre_publish, ctx.state.release.as_ref())?;
    let output = run_configured(ctx, &command)?;

    if !commands.pre_publish_accepted_exit_codes.contains(&output.exit_code) {
      return Err(ShipError::PrePublishValidation {
        exit_code: output.exit_code,
        output: output.combined(),
      });
    }

    let report = StepReport::done().info("Package validated successfully");
    if output.success() {
      Ok(report)
    } else {
      Ok(report.warn(format!("Validation passed with warnings (exit code {})", output.exit_code)))
    }
  }
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

  fn pre_publish(exit_code: i32) -> ShipResult<StepReport> {
    let dir = tempfile::tempdir().unwrap();
    let config = ShipConfig::default();
    let options = RunOptions::default();
    let fake = FakeGateway::new();
    fake.on(
      "flutter pub publish --dry-run",
      ToolOutput {
        exit_code,
        stdout: "Package has 1 warning.".to_string(),
        stderr: String::new(),
      },
    );
    let operator = ScriptedOperator::default();
    let mut ctx = testing::context(dir.path(), &config, &options, &fake, &operator);
    PrePublishValidate.run(&mut ctx)
  }

  #[test]
  fn test_pre_publish_accepts_warning_exit_code() {
    assert!(pre_publish(0).unwrap().warnings.is_empty());
    assert_eq!(pre_publish(65).unwrap().warnings.len(), 1);
  }

  #[test]
  fn test_pre_publish_rejects_other_codes() {
    let err = pre_publish(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PrePublishValidationFailure);
    assert!(err.to_string().contains("Package has 1 warning."));
  }

  #[test]
  fn test_doc_generation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = ShipConfig::default();
    let options = RunOptions::default();
    let fake = FakeGateway::new();
    fake.on("dart doc", ToolOutput::failed(2, "dartdoc crashed"));
    let operator = ScriptedOperator::default();
    let mut ctx = testing::context(dir.path(), &config, &options, &fake, &operator);
    let err = GenerateDocs.run(&mut ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DocGenerationFailure);
  }

  #[test]
  fn test_dry_run_docs_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = ShipConfig::default();
    let options = RunOptions {
      dry_run: true,
      ..RunOptions::default()
    };
    let fake = FakeGateway::new();
    let operator = ScriptedOperator::default();
    let mut ctx = testing::context(dir.path(), &config, &options, &fake, &operator);
    GenerateDocs.run(&mut ctx).unwrap();
    assert_eq!(fake.calls(), vec!["dart doc --dry-run"]);
  }
}
