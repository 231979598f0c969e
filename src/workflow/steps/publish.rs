use super::{configured_command, release_target, run_configured};
use crate::core::error::{ShipError, ShipResult};
use crate::workflow::context::RunContext;
use crate::workflow::outcome::{ActionRecord, StepReport};
use crate::workflow::step::{Step, StepId};

/// Upload the package to its registry
///
/// Idempotent only when `commands.publish_check` is configured; without it the
/// registry itself is expected to reject a duplicate version.
pub struct Publish;

impl Step for Publish {
  fn id(&self) -> StepId {
    StepId::Publish
  }

  fn is_satisfied(&self, ctx: &RunContext<'_>) -> ShipResult<Option<String>> {
    let Some(check) = &ctx.config.commands.publish_check else {
      return Ok(None);
    };
    let target = release_target(ctx, self.id())?;
    let command = configured_command("commands.publish_check", check, Some(target))?;
    let output = run_configured(ctx, &command)?;
    Ok(
      output
        .success()
        .then(|| format!("{} {} is already published", target.package, target.version)),
    )
  }

  fn describe(&self, ctx: &RunContext<'_>) -> ShipResult<Vec<String>> {
    let target = release_target(ctx, self.id())?;
    let command = configured_command("commands.publish", &ctx.config.commands.publish, Some(target))?;
    Ok(vec![format!("Run `{}`", command)])
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let target = release_target(ctx, self.id())?;
    let command = configured_command("commands.publish", &ctx.config.commands.publish, Some(target))?;
    let output = run_configured(ctx, &command)?;
    if !output.success() {
      return Err(ShipError::Publish {
        exit_code: output.exit_code,
        output: output.combined(),
      });
    }
    Ok(StepReport::done().action(ActionRecord::done(format!(
      "Published {} {}",
      target.package, target.version
    ))))
  }
}
