//! Step implementations
//!
//! - **preflight**: prerequisites, working tree, remote sync
//! - **gates**: format, test, analyze
//! - **changelog**: version cross-check and release notes
//! - **validation**: documentation and pre-publish dry run
//! - **confirm**: final operator confirmation
//! - **publish**: registry upload
//! - **vcs**: commit, push and tag
//! - **release**: code-hosting release

mod changelog;
mod confirm;
mod gates;
mod preflight;
mod publish;
mod release;
mod validation;
mod vcs;

use crate::core::error::{ShipError, ShipResult};
use crate::gateway::{ToolCommand, ToolOutput};
use crate::workflow::context::{ReleaseTarget, RunContext};
use crate::workflow::step::{Step, StepId};

/// Implementation for a step id
pub fn build(id: StepId) -> Box<dyn Step> {
  match id {
    StepId::CheckPrerequisites => Box::new(preflight::CheckPrerequisites),
    StepId::CheckRepoState => Box::new(preflight::CheckRepoState),
    StepId::CheckRemoteSync => Box::new(preflight::CheckRemoteSync),
    StepId::Format | StepId::Test | StepId::Analyze => Box::new(gates::QualityGate::new(id)),
    StepId::ValidateChangelog => Box::new(changelog::ValidateChangelog),
    StepId::GenerateDocs => Box::new(validation::GenerateDocs),
    StepId::PrePublishValidate => Box::new(validation::PrePublishValidate),
    StepId::Confirm => Box::new(confirm::Confirm),
    StepId::Publish => Box::new(publish::Publish),
    StepId::CommitAndPush => Box::new(vcs::CommitAndPush),
    StepId::CreateTag => Box::new(vcs::CreateTag),
    StepId::CreateRelease => Box::new(release::CreateRelease),
  }
}

/// Ask the operator whether to proceed past a recoverable condition
///
/// On yes the condition becomes a warning line; on no the run is cancelled and
/// the condition's remediation is carried into the cancellation.
fn checkpoint(
  ctx: &RunContext<'_>,
  condition: ShipError,
  question: &str,
  details: &[String],
  name: &str,
) -> ShipResult<String> {
  if ctx.operator.confirm(question, details)? {
    Ok(condition.to_string())
  } else {
    Err(ShipError::UserCancelled {
      checkpoint: name.to_string(),
      help: condition.help_message(),
    })
  }
}

/// Release target or an error naming the step that needed it
fn release_target<'c>(ctx: &'c RunContext<'_>, id: StepId) -> ShipResult<&'c ReleaseTarget> {
  ctx.state.release.as_ref().ok_or_else(|| {
    ShipError::with_help(
      format!("{} requires a validated release version", id),
      "Keep validate-changelog in workflow.order before every publishing step.",
    )
  })
}

/// Build a configured command, substituting `{name}`, `{version}` and `{tag}`
fn configured_command(field: &str, argv: &[String], target: Option<&ReleaseTarget>) -> ShipResult<ToolCommand> {
  let expanded: Vec<String> = match target {
    Some(target) => argv
      .iter()
      .map(|arg| {
        arg
          .replace("{name}", &target.package)
          .replace("{version}", &target.version.to_string())
          .replace("{tag}", &target.tag())
      })
      .collect(),
    None => argv.to_vec(),
  };
  ToolCommand::from_argv(field, &expanded)
}

/// Run a configured command in the project root with captured output
fn run_configured(ctx: &RunContext<'_>, command: &ToolCommand) -> ShipResult<ToolOutput> {
  ctx.gateway.invoke(command, ctx.root)
}
