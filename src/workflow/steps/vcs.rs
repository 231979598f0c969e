use super::release_target;
use crate::core::error::ShipResult;
use crate::core::vcs::Git;
use crate::workflow::context::RunContext;
use crate::workflow::outcome::{ActionRecord, StepReport};
use crate::workflow::step::{Step, StepId};

/// Commit pending changes (formatting, release edits) and push the branch
pub struct CommitAndPush;

impl CommitAndPush {
  /// Whether the remote branch is missing or behind HEAD
  fn needs_push(git: &Git<'_>, branch: &str) -> ShipResult<bool> {
    if !git.remote_branch_exists(branch)? {
      return Ok(true);
    }
    let ahead = git.count_commits(&format!("{}/{}..HEAD", git.remote(), branch))?;
    Ok(ahead.is_none_or(|n| n > 0))
  }
}

impl Step for CommitAndPush {
  fn id(&self) -> StepId {
    StepId::CommitAndPush
  }

  fn is_satisfied(&self, ctx: &RunContext<'_>) -> ShipResult<Option<String>> {
    let git = ctx.git();
    if !git.status_porcelain()?.is_empty() || Self::needs_push(&git, &ctx.branch)? {
      return Ok(None);
    }
    Ok(Some(format!(
      "nothing to commit and {}/{} is up to date",
      git.remote(),
      ctx.branch
    )))
  }

  fn describe(&self, ctx: &RunContext<'_>) -> ShipResult<Vec<String>> {
    let target = release_target(ctx, self.id())?;
    let git = ctx.git();
    let mut lines = Vec::new();
    if !git.status_porcelain()?.is_empty() {
      lines.push(format!("Commit all changes as \"Release {}\"", target.tag()));
    }
    // A pending commit always needs pushing
    if !lines.is_empty() || Self::needs_push(&git, &ctx.branch)? {
      lines.push(format!("Push {} to {}", ctx.branch, git.remote()));
    }
    Ok(lines)
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let target = release_target(ctx, self.id())?;
    let git = ctx.git();
    let mut report = StepReport::done();

    let commit = format!("Commit changes as \"Release {}\"", target.tag());
    if git.status_porcelain()?.is_empty() {
      report = report.action(ActionRecord::skipped(commit, "nothing to commit"));
    } else {
      git.commit_all(&format!("Release {}", target.tag()))?;
      report = report.action(ActionRecord::done(commit));
    }

    let push = format!("Push {} to {}", ctx.branch, git.remote());
    if Self::needs_push(&git, &ctx.branch)? {
      git.push(&ctx.branch)?;
      report = report.action(ActionRecord::done(push));
    } else {
      report = report.action(ActionRecord::skipped(push, "already up to date"));
    }

    Ok(report)
  }
}

/// Annotated `v{version}` tag, created locally and pushed
///
/// The two halves are checked independently so a run that created the tag but
/// failed to push it resumes with just the push.
pub struct CreateTag;

impl Step for CreateTag {
  fn id(&self) -> StepId {
    StepId::CreateTag
  }

  fn is_satisfied(&self, ctx: &RunContext<'_>) -> ShipResult<Option<String>> {
    let tag = release_target(ctx, self.id())?.tag();
    let git = ctx.git();
    if git.local_tag_exists(&tag)? && git.remote_tag_exists(&tag)? {
      return Ok(Some(format!("tag {} exists locally and on {}", tag, git.remote())));
    }
    Ok(None)
  }

  fn describe(&self, ctx: &RunContext<'_>) -> ShipResult<Vec<String>> {
    let tag = release_target(ctx, self.id())?.tag();
    let git = ctx.git();
    let mut lines = Vec::new();
    if !git.local_tag_exists(&tag)? {
      lines.push(format!("Create tag {}", tag));
    }
    if !git.remote_tag_exists(&tag)? {
      lines.push(format!("Push tag {} to {}", tag, git.remote()));
    }
    Ok(lines)
  }

  fn run(&self, ctx: &mut RunContext<'_>) -> ShipResult<StepReport> {
    let tag = release_target(ctx, self.id())?.tag();
    let git = ctx.git();
    let mut report = StepReport::done();

    let create = format!("Create tag {}", tag);
    if git.local_tag_exists(&tag)? {
      report = report.action(ActionRecord::skipped(create, "already exists locally"));
    } else {
      git.create_tag(&tag, &format!("Release {}", tag))?;
      report = report.action(ActionRecord::done(create));
    }

    let push = format!("Push tag {} to {}", tag, git.remote());
    if git.remote_tag_exists(&tag)? {
      report = report.action(ActionRecord::skipped(push, format!("already on {}", git.remote())));
    } else {
      git.push(&tag)?;
      report = report.action(ActionRecord::done(push));
    }

    Ok(report)
  }
}
