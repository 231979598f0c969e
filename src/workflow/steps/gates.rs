use super::{configured_command, run_configured};
use crate::core::error::{ShipError, ShipResult};
use crate::workflow::context::RunContext;
use crate::workflow::outcome::{SkipReason, StepReport};
use crate::workflow::step::{Step, StepId};

/// Exit code of the check-only formatter when files would change
const FORMAT_CHECK_CHANGED: i32 = 1;

/// Format, test or analyze: one configured command that must exit 0
///
/// In dry runs the format gate uses `commands.format_check`, which leaves the
/// tree alone.
pub struct QualityGate {
  id: StepId,
}

impl QualityGate {
  pub fn new(id: StepId) -> Self {
    Self { id }
  }

  fn command<'c>(&self, ctx: &'c RunContext<'_>) -> (&'static str, &'c [String]) {
    let commands = &ctx.config.commands;
    match self.id {
      StepId::Format if ctx.options.dry_run => ("commands.format_check", &commands.format_check),
      StepId::Format => ("commands.format", &commands.format),
      StepId::Test => ("commands.test", &commands.test),
      _ => ("commands.analyze", &commands.analyze),
    }
  }

  fn gate_name(&self) -> &'static str {
    match self.id {
      StepId::Format => "Formatting",
      StepId::Test => "Tests",
      _ => "Static analysis",
    }
  }
}

impl Step for QualityGate {
  fn id(&self) -> StepId {
    self.id
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    if self.id == StepId::Test
      && let Some(required) = &ctx.config.commands.test_requires_path
      && !ctx.project_path(required).exists()
    {
      return Ok(StepReport::skipped(
        SkipReason::NotApplicable,
        format!("no {} directory found", required.display()),
      ));
    }

    let checking_format = self.id == StepId::Format && ctx.options.dry_run;

    // Formatting is judged by whether it changed the tree, so snapshot first
    let before = match self.id {
      StepId::Format if !checking_format => Some(ctx.git().status_porcelain()?),
      _ => None,
    };

    let (field, argv) = self.command(ctx);
    let command = configured_command(field, argv, ctx.state.release.as_ref())?;
    let output = run_configured(ctx, &command)?;
    if checking_format && output.exit_code == FORMAT_CHECK_CHANGED {
      return Ok(
        StepReport::done().warn("Formatting would change files; a real run includes them in the release commit"),
      );
    }
    if !output.success() {
      return Err(ShipError::QualityGate {
        gate: self.gate_name().to_string(),
        exit_code: output.exit_code,
        output: output.combined(),
      });
    }

    let report = StepReport::done().info(format!("{} passed", command));
    match before {
      Some(before) if ctx.git().status_porcelain()? != before => {
        Ok(report.warn("Files were formatted; the changes will be included in the release commit"))
      }
      Some(_) => Ok(report.info("All files already formatted")),
      None => Ok(report),
    }
  }
}
