//! Step outcomes and the run trace

use crate::core::error::{ErrorKind, ExitCode};
use crate::release::version::Version;
use crate::workflow::step::StepId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why a step did not perform its action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
  /// Idempotency check found the effect already in place
  AlreadySatisfied,
  /// Mutation replaced by a description
  DryRun,
  /// Turned off in configuration
  Disabled,
  /// Doesn't apply here (platform, missing test directory)
  NotApplicable,
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum StepOutcome {
  Success,
  Skipped { reason: SkipReason, detail: String },
  Failed { kind: ErrorKind, message: String },
  /// Failure of a step whose policy is `warn`; the run continued
  Tolerated { kind: ErrorKind, message: String },
}

impl StepOutcome {
  pub fn is_failure(&self) -> bool {
    matches!(self, StepOutcome::Failed { .. })
  }
}

/// Status of a sub-action within a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ActionStatus {
  Done,
  Skipped { detail: String },
  /// Dry-run: would have been performed
  Planned,
}

/// One sub-action (create tag locally, push tag) and what happened to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
  pub description: String,
  #[serde(flatten)]
  pub status: ActionStatus,
}

impl ActionRecord {
  pub fn done(description: impl Into<String>) -> Self {
    Self {
      description: description.into(),
      status: ActionStatus::Done,
    }
  }

  pub fn skipped(description: impl Into<String>, detail: impl Into<String>) -> Self {
    Self {
      description: description.into(),
      status: ActionStatus::Skipped { detail: detail.into() },
    }
  }

  pub fn planned(description: impl Into<String>) -> Self {
    Self {
      description: description.into(),
      status: ActionStatus::Planned,
    }
  }
}

/// What a step's `run` reports back to the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
  /// Set when the step decided at run time that it doesn't apply
  pub skip: Option<(SkipReason, String)>,
  pub actions: Vec<ActionRecord>,
  pub warnings: Vec<String>,
  pub info: Vec<String>,
}

impl StepReport {
  pub fn done() -> Self {
    Self::default()
  }

  pub fn skipped(reason: SkipReason, detail: impl Into<String>) -> Self {
    Self {
      skip: Some((reason, detail.into())),
      ..Self::default()
    }
  }

  pub fn action(mut self, action: ActionRecord) -> Self {
    self.actions.push(action);
    self
  }

  pub fn warn(mut self, warning: impl Into<String>) -> Self {
    self.warnings.push(warning.into());
    self
  }

  pub fn info(mut self, line: impl Into<String>) -> Self {
    self.info.push(line.into());
    self
  }
}

/// Trace entry for one executed (or skipped) step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
  pub step: StepId,
  pub outcome: StepOutcome,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub actions: Vec<ActionRecord>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub info: Vec<String>,
  /// Remediation for failed or tolerated steps
  #[serde(skip_serializing_if = "Option::is_none")]
  pub help: Option<String>,
  pub started_at: DateTime<Utc>,
  pub duration_ms: u64,
}

/// Terminal status of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RunStatus {
  Complete,
  /// The operator declined at a checkpoint
  Cancelled { step: StepId },
  Failed { exit_code: ExitCode, step: StepId },
}

impl RunStatus {
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RunStatus::Complete => ExitCode::Success,
      RunStatus::Cancelled { .. } => ExitCode::UserCancelled,
      RunStatus::Failed { exit_code, .. } => *exit_code,
    }
  }
}

/// Ordered trace of a whole run; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRun {
  pub package: Option<String>,
  pub version: Option<Version>,
  pub branch: String,
  pub dry_run: bool,
  pub plan_id: String,
  pub records: Vec<StepRecord>,
  pub status: RunStatus,
}

impl WorkflowRun {
  pub fn record(&self, step: StepId) -> Option<&StepRecord> {
    self.records.iter().find(|r| r.step == step)
  }

  pub fn exit_code(&self) -> ExitCode {
    self.status.exit_code()
  }
}
