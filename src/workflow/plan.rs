//! Resolved release plan
//!
//! The plan is the configured step order with each step's effective settings
//! applied. It is what `shiprail plan` prints and what the orchestrator walks.
//! Its id is a SHA-256 over the serialized contents, so two runs with the same
//! id execute the same sequence against the same release target.

use crate::core::config::ShipConfig;
use crate::core::error::ShipResult;
use crate::release::version::Version;
use crate::workflow::step::{FailurePolicy, Platform, StepId};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Plan identifier (SHA256 hash of plan contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// One step as it will execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
  pub step: StepId,
  pub mutates: bool,
  pub exit_code: i32,
  pub on_failure: FailurePolicy,
  /// Why the step will be skipped regardless of project state
  #[serde(skip_serializing_if = "Option::is_none")]
  pub skip: Option<String>,
}

/// Ordered steps for a release
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowPlan {
  pub id: PlanId,
  pub package: Option<String>,
  pub version: Option<Version>,
  pub steps: Vec<PlannedStep>,
}

impl WorkflowPlan {
  /// Resolve the plan for the current platform
  pub fn resolve(config: &ShipConfig, package: Option<String>, version: Option<Version>) -> Self {
    Self::resolve_for(config, package, version, Platform::current())
  }

  /// Resolve the plan as it would run on `platform`
  pub fn resolve_for(
    config: &ShipConfig,
    package: Option<String>,
    version: Option<Version>,
    platform: Option<Platform>,
  ) -> Self {
    let steps: Vec<PlannedStep> = config
      .workflow
      .order
      .iter()
      .map(|&step| {
        let settings = config.step_settings(step);
        let skip = if !settings.enabled {
          Some("disabled in configuration".to_string())
        } else {
          platform
            .filter(|p| settings.skip_on.contains(p))
            .map(|p| format!("skipped on {}", p))
        };
        PlannedStep {
          step,
          mutates: step.mutates(),
          exit_code: step.failure_exit_code().as_i32(),
          on_failure: settings.on_failure,
          skip,
        }
      })
      .collect();

    let mut plan = Self {
      id: PlanId::from_contents(&[]),
      package,
      version,
      steps,
    };
    plan.recompute_id();
    plan
  }

  /// Recompute plan ID based on current contents
  fn recompute_id(&mut self) {
    let contents = (&self.package, &self.version, &self.steps);
    let json = serde_json::to_vec(&contents).unwrap_or_default();
    self.id = PlanId::from_contents(&json);
  }

  pub fn step_ids(&self) -> impl Iterator<Item = StepId> + '_ {
    self.steps.iter().map(|s| s.step)
  }

  /// Serialize to JSON
  pub fn to_json(&self) -> ShipResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    output.push_str(&format!("📋 Release plan ({})\n", self.id));

    if let Some(ref package) = self.package {
      output.push_str(&format!("   Package: {}\n", package));
    }
    if let Some(version) = self.version {
      output.push_str(&format!("   Version: {} (tag {})\n", version, version.tag_name()));
    }

    output.push_str(&format!("\n   Steps ({}):\n", self.steps.len()));

    for (i, planned) in self.steps.iter().enumerate() {
      let mut line = format!("   {:>2}. {:<22} {}", i + 1, planned.step.as_str(), planned.step.title());
      if planned.mutates {
        line.push_str("  [mutates]");
      }
      if planned.on_failure == FailurePolicy::Warn {
        line.push_str("  [warn only]");
      }
      if let Some(ref skip) = planned.skip {
        line.push_str(&format!("  (skip: {})", skip));
      }
      output.push_str(&line);
      output.push('\n');
    }

    if self.steps.iter().any(|s| s.mutates) {
      output.push_str("\n⚠️  NOTE: Steps marked [mutates] publish, push, tag or create a release\n");
      output.push_str("   (each is skipped when its effect is already in place)\n");
    }

    output
  }
}
