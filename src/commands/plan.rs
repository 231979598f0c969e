//! Plan command: the resolved workflow without running it

use crate::core::context::ProjectContext;
use crate::core::error::ShipResult;
use crate::release::version::Version;
use crate::workflow::peek_release;
use crate::workflow::plan::WorkflowPlan;

/// Print the step sequence and plan id a release run would use
pub fn run_plan(ctx: &ProjectContext, version: Option<Version>, json: bool) -> ShipResult<()> {
  let (package, version) = peek_release(&ctx.root, &ctx.config, version);
  let plan = WorkflowPlan::resolve(&ctx.config, package, version);

  if json {
    println!("{}", plan.to_json()?);
  } else {
    print!("{}", plan.to_human_readable());
  }
  Ok(())
}
