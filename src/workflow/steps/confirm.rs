use super::release_target;
use crate::core::error::{ShipError, ShipResult};
use crate::workflow::context::RunContext;
use crate::workflow::outcome::{SkipReason, StepReport};
use crate::workflow::step::{Step, StepId};

/// Last checkpoint before anything leaves the machine
pub struct Confirm;

impl Step for Confirm {
  fn id(&self) -> StepId {
    StepId::Confirm
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    if ctx.options.dry_run {
      return Ok(StepReport::skipped(SkipReason::DryRun, "confirmation not requested in dry run"));
    }

    let target = release_target(ctx, self.id())?;
    let details = vec![
      format!("Package: {}", target.package),
      format!("Version: {} (tag {})", target.version, target.tag()),
      format!("Branch:  {} -> {}", ctx.branch, ctx.config.project.remote),
    ];
    let question = format!("Publish {} {}?", target.package, target.version);

    if !ctx.operator.confirm(&question, &details)? {
      return Err(ShipError::UserCancelled {
        checkpoint: "final confirmation".to_string(),
        help: Some("Nothing was published. Re-run when ready.".to_string()),
      });
    }
    Ok(StepReport::done().info("Confirmed by operator"))
  }
}
