//! The release state machine
//!
//! Walks the resolved plan one step at a time. For each step it applies, in
//! order: the release-target guard for `confirm` and mutating steps, the
//! `enabled` flag, the platform skip list, the idempotency check, and dry-run
//! substitution. Only
//! then does it run the step. The first fatal failure ends the run; later
//! steps never start and never appear in the trace.

use crate::core::config::{ShipConfig, StepSettings};
use crate::core::error::{ExitCode, ShipError, ShipResult};
use crate::core::vcs::{Git, inspector};
use crate::gateway::ToolGateway;
use crate::release::version::{Version, extract_package_name, extract_version};
use crate::ui::prompt::Operator;
use crate::workflow::context::{RunContext, RunOptions, RunState};
use crate::workflow::events::{EventSink, WorkflowEvent};
use crate::workflow::outcome::{ActionRecord, RunStatus, SkipReason, StepOutcome, StepRecord, StepReport, WorkflowRun};
use crate::workflow::plan::WorkflowPlan;
use crate::workflow::step::{FailurePolicy, Platform, Step};
use crate::workflow::steps;
use chrono::Utc;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives one release run
pub struct Orchestrator<'a> {
  root: &'a Path,
  config: &'a ShipConfig,
  gateway: &'a dyn ToolGateway,
  operator: &'a dyn Operator,
}

/// How one step ended, before it becomes a record
struct Executed {
  outcome: StepOutcome,
  report: StepReport,
  help: Option<String>,
  /// Set when the run must stop
  halt: Option<ExitCode>,
}

impl<'a> Orchestrator<'a> {
  pub fn new(
    root: &'a Path,
    config: &'a ShipConfig,
    gateway: &'a dyn ToolGateway,
    operator: &'a dyn Operator,
  ) -> Self {
    Self {
      root,
      config,
      gateway,
      operator,
    }
  }

  /// Execute the workflow, emitting events as steps start and finish
  pub fn run(&self, options: &RunOptions, sink: &mut dyn EventSink) -> WorkflowRun {
    let (package, version) = peek_release(self.root, self.config, options.version);
    let plan = WorkflowPlan::resolve(self.config, package.clone(), version);

    let git = Git::new(self.gateway, self.root, &self.config.project.remote);
    let branch = options.branch.clone().unwrap_or_else(|| inspector::current_branch(&git));
    let remote_url = git.remote_url().unwrap_or_else(|err| {
      debug!(error = %err, "could not read remote url");
      None
    });

    info!(plan = %plan.id, %branch, dry_run = options.dry_run, "release run started");
    sink.emit(&WorkflowEvent::RunStarted {
      package: package.clone(),
      version,
      branch: branch.clone(),
      remote_url,
      dry_run: options.dry_run,
      plan_id: plan.id.short().to_string(),
    });

    if let Some(message) = self.credential_warning() {
      sink.emit(&WorkflowEvent::Warning { message });
    }

    let mut ctx = RunContext {
      root: self.root,
      config: self.config,
      options,
      gateway: self.gateway,
      operator: self.operator,
      branch: branch.clone(),
      state: RunState::default(),
    };

    let mut records = Vec::new();
    let mut status = RunStatus::Complete;

    for id in plan.step_ids() {
      sink.emit(&WorkflowEvent::StepStarted { step: id });
      let step = steps::build(id);
      let settings = self.config.step_settings(id);

      let started_at = Utc::now();
      let timer = Instant::now();
      let executed = execute(step.as_ref(), &settings, &mut ctx);
      let record = StepRecord {
        step: id,
        outcome: executed.outcome,
        actions: executed.report.actions,
        warnings: executed.report.warnings,
        info: executed.report.info,
        help: executed.help,
        started_at,
        duration_ms: timer.elapsed().as_millis() as u64,
      };
      debug!(step = %id, outcome = ?record.outcome, duration_ms = record.duration_ms, "step finished");

      sink.emit(&WorkflowEvent::StepFinished { record: record.clone() });
      records.push(record);

      if let Some(exit_code) = executed.halt {
        warn!(step = %id, %exit_code, "release run halted");
        status = match exit_code {
          ExitCode::UserCancelled => RunStatus::Cancelled { step: id },
          exit_code => RunStatus::Failed { exit_code, step: id },
        };
        break;
      }
    }

    sink.emit(&WorkflowEvent::RunFinished { status: status.clone() });

    WorkflowRun {
      package: ctx.state.release.as_ref().map(|r| r.package.clone()).or(package),
      version: ctx.state.release.as_ref().map(|r| r.version).or(version),
      branch,
      dry_run: options.dry_run,
      plan_id: plan.id.short().to_string(),
      records,
      status,
    }
  }

  /// Warning shown up front when a credential override is present in the environment
  fn credential_warning(&self) -> Option<String> {
    let var = self.config.credentials.env.as_deref()?;
    let value = env::var_os(var)?;
    (!value.is_empty()).then(|| {
      format!(
        "{} is set; the release tool will use it instead of your stored login",
        var
      )
    })
  }
}

/// Best-effort package name and version for headers and the plan id
///
/// Failures here are not reported; `validate-changelog` reads the same files
/// and fails properly.
pub fn peek_release(root: &Path, config: &ShipConfig, version: Option<Version>) -> (Option<String>, Option<Version>) {
  let manifest = fs::read_to_string(root.join(&config.project.manifest)).ok();
  let package = manifest.as_deref().and_then(|m| extract_package_name(m).ok());
  let version = version.or_else(|| manifest.as_deref().and_then(|m| extract_version(m).ok()));
  (package, version)
}

/// Run one step through the guards and map the result to an outcome
fn execute(step: &dyn Step, settings: &StepSettings, ctx: &mut RunContext<'_>) -> Executed {
  let id = step.id();

  if id.needs_release() && ctx.state.release.is_none() {
    // Reachable when validate-changelog was tolerated
    let err = ShipError::with_help(
      format!("Refusing to run {}: the release version was not validated against the changelog", id),
      "Fix the changelog validation failure. Publishing steps never run without it.",
    );
    return Executed {
      outcome: StepOutcome::Failed {
        kind: err.kind(),
        message: err.to_string(),
      },
      report: StepReport::default(),
      help: err.help_message(),
      halt: Some(ExitCode::ChangelogInvalid),
    };
  }

  match attempt(step, settings, ctx) {
    Ok((outcome, report)) => Executed {
      outcome,
      report,
      help: None,
      halt: None,
    },
    Err(err) => {
      let kind = err.kind();
      let message = err.to_string();
      let help = err.help_message();
      if err.is_cancellation() {
        Executed {
          outcome: StepOutcome::Failed { kind, message },
          report: StepReport::default(),
          help,
          halt: Some(ExitCode::UserCancelled),
        }
      } else if settings.on_failure == FailurePolicy::Warn {
        warn!(step = %id, error = %message, "step failure tolerated by policy");
        Executed {
          outcome: StepOutcome::Tolerated { kind, message },
          report: StepReport::default(),
          help,
          halt: None,
        }
      } else {
        Executed {
          outcome: StepOutcome::Failed { kind, message },
          report: StepReport::default(),
          help,
          halt: Some(id.failure_exit_code()),
        }
      }
    }
  }
}

fn attempt(step: &dyn Step, settings: &StepSettings, ctx: &mut RunContext<'_>) -> ShipResult<(StepOutcome, StepReport)> {
  let id = step.id();
  let skipped = |reason, detail: String| (StepOutcome::Skipped { reason, detail }, StepReport::default());

  if !settings.enabled {
    return Ok(skipped(SkipReason::Disabled, "disabled in configuration".to_string()));
  }

  if let Some(platform) = Platform::current()
    && settings.skip_on.contains(&platform)
  {
    return Ok(skipped(SkipReason::NotApplicable, format!("skipped on {}", platform)));
  }

  if let Some(reason) = step.is_satisfied(ctx)? {
    debug!(step = %id, %reason, "already satisfied");
    return Ok(skipped(SkipReason::AlreadySatisfied, reason));
  }

  if id.mutates() && ctx.options.dry_run {
    let report = step
      .describe(ctx)?
      .into_iter()
      .fold(StepReport::default(), |report, line| report.action(ActionRecord::planned(line)));
    return Ok((
      StepOutcome::Skipped {
        reason: SkipReason::DryRun,
        detail: "dry run".to_string(),
      },
      report,
    ));
  }

  let report = step.run(ctx)?;
  let outcome = match &report.skip {
    Some((reason, detail)) => StepOutcome::Skipped {
      reason: *reason,
      detail: detail.clone(),
    },
    None => StepOutcome::Success,
  };
  Ok((outcome, report))
}
