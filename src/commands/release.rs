//! Release command implementation

use crate::core::context::ProjectContext;
use crate::core::error::{ExitCode, ShipResult};
use crate::gateway::SystemGateway;
use crate::ui::prompt::{AutoConfirm, Operator, TerminalOperator};
use crate::ui::reporter::{LogSink, TerminalReporter};
use crate::workflow::events::EventSink;
use crate::workflow::{Orchestrator, RunOptions};

/// Switches for a release run
#[derive(Debug, Clone, Default)]
pub struct ReleaseArgs {
  pub options: RunOptions,
  /// Answer yes at every checkpoint
  pub yes: bool,
  /// Print the run trace as JSON instead of progress
  pub json: bool,
}

/// Run the release workflow and return the exit code it ended with
///
/// Step failures are part of the run trace, not errors: they are reported by the
/// reporter (or in the JSON trace) and surface only as the exit code.
pub fn run_release(ctx: &ProjectContext, args: ReleaseArgs) -> ShipResult<ExitCode> {
  let gateway = SystemGateway::new();
  let operator: Box<dyn Operator> = if args.yes {
    Box::new(AutoConfirm)
  } else {
    Box::new(TerminalOperator)
  };
  let orchestrator = Orchestrator::new(&ctx.root, &ctx.config, &gateway, operator.as_ref());

  let mut sink: Box<dyn EventSink> = if args.json {
    Box::new(LogSink)
  } else {
    Box::new(TerminalReporter::stdout(ctx.config.project.package_url.clone()))
  };

  let run = orchestrator.run(&args.options, sink.as_mut());
  if args.json {
    println!("{}", serde_json::to_string_pretty(&run)?);
  }
  Ok(run.exit_code())
}
