use super::checkpoint;
use crate::checks::{check_all, check_files};
use crate::core::error::{ShipError, ShipResult};
use crate::core::vcs::inspector;
use crate::workflow::context::RunContext;
use crate::workflow::outcome::StepReport;
use crate::workflow::step::{Step, StepId};

pub struct CheckPrerequisites;

impl Step for CheckPrerequisites {
  fn id(&self) -> StepId {
    StepId::CheckPrerequisites
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let project = &ctx.config.project;
    let report = check_files(
      check_all(ctx.gateway, &ctx.config.tools),
      ctx.root,
      &[
        ("manifest", project.manifest.as_path()),
        ("changelog", project.changelog.as_path()),
      ],
    )
    .into_result()?;

    Ok(
      report
        .tools
        .iter()
        .fold(StepReport::done(), |out, tool| out.info(format!("{} found", tool.name))),
    )
  }
}

pub struct CheckRepoState;

impl Step for CheckRepoState {
  fn id(&self) -> StepId {
    StepId::CheckRepoState
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let state = inspector::check_clean(&ctx.git())?;
    if state.is_clean {
      return Ok(StepReport::done().info("Working tree is clean"));
    }

    let details: Vec<String> = state.dirty_diff_summary.lines().map(str::to_string).collect();
    let warning = checkpoint(
      ctx,
      ShipError::RepoDirty {
        summary: state.dirty_diff_summary.clone(),
      },
      "These changes will be included in the release commit. Continue?",
      &details,
      "uncommitted changes",
    )?;
    Ok(StepReport::done().warn(warning))
  }
}

pub struct CheckRemoteSync;

impl Step for CheckRemoteSync {
  fn id(&self) -> StepId {
    StepId::CheckRemoteSync
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let git = ctx.git();
    let state = inspector::check_remote_sync(&git, &ctx.branch)?;

    if !state.fetch_succeeded {
      return Ok(StepReport::done().warn(format!(
        "Could not fetch {} from {}. Proceeding anyway (the remote branch may not exist yet).",
        ctx.branch,
        git.remote()
      )));
    }

    state.ensure_not_behind(git.remote(), &ctx.branch)?;

    if state.ahead_count > 0 {
      return Ok(StepReport::done().warn(format!(
        "{} unpushed commit(s) will be included in the release",
        state.ahead_count
      )));
    }
    Ok(StepReport::done().info(format!("In sync with {}/{}", git.remote(), ctx.branch)))
  }
}
