//! Structured events emitted by the orchestrator
//!
//! The orchestrator never prints. Rendering belongs to whatever [`EventSink`]
//! it is given: the terminal reporter, the JSON collector, or a recorder in tests.

use crate::release::version::Version;
use crate::workflow::outcome::{RunStatus, StepRecord};
use crate::workflow::step::StepId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum WorkflowEvent {
  RunStarted {
    package: Option<String>,
    version: Option<Version>,
    branch: String,
    remote_url: Option<String>,
    dry_run: bool,
    plan_id: String,
  },
  /// Run-level warning raised before the first step
  Warning { message: String },
  StepStarted { step: StepId },
  StepFinished { record: StepRecord },
  RunFinished { status: RunStatus },
}

/// Receiver for workflow events
pub trait EventSink {
  fn emit(&mut self, event: &WorkflowEvent);
}

/// Keeps every event, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
  pub events: Vec<WorkflowEvent>,
}

#[cfg(test)]
impl EventSink for RecordingSink {
  fn emit(&mut self, event: &WorkflowEvent) {
    self.events.push(event.clone());
  }
}

#[cfg(test)]
impl RecordingSink {
  /// Steps that were started, in order
  pub fn started_steps(&self) -> Vec<StepId> {
    self
      .events
      .iter()
      .filter_map(|event| match event {
        WorkflowEvent::StepStarted { step } => Some(*step),
        _ => None,
      })
      .collect()
  }

  pub fn warnings(&self) -> Vec<&str> {
    self
      .events
      .iter()
      .filter_map(|event| match event {
        WorkflowEvent::Warning { message } => Some(message.as_str()),
        _ => None,
      })
      .collect()
  }
}
