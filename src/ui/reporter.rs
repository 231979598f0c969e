//! Rendering of workflow events
//!
//! [`TerminalReporter`] prints progress for humans. [`LogSink`] is used with
//! `--json`, where the only stdout output is the final trace and events go to
//! the log instead.

use crate::core::error::ExitCode;
use crate::core::vcs::github_repo_path;
use crate::release::version::Version;
use crate::workflow::events::{EventSink, WorkflowEvent};
use crate::workflow::outcome::{ActionStatus, RunStatus, SkipReason, StepOutcome, StepRecord};
use anstyle::{AnsiColor, Color, Style};
use std::io::{self, IsTerminal, Write};

/// Colors for status markers
struct Palette {
  ok: Style,
  warn: Style,
  fail: Style,
  dim: Style,
  bold: Style,
}

impl Palette {
  fn colored() -> Self {
    let fg = |c| Style::new().fg_color(Some(Color::Ansi(c)));
    Self {
      ok: fg(AnsiColor::Green).bold(),
      warn: fg(AnsiColor::Yellow).bold(),
      fail: fg(AnsiColor::Red).bold(),
      dim: fg(AnsiColor::BrightBlack),
      bold: Style::new().bold(),
    }
  }

  fn plain() -> Self {
    Self {
      ok: Style::new(),
      warn: Style::new(),
      fail: Style::new(),
      dim: Style::new(),
      bold: Style::new(),
    }
  }
}

fn paint(style: Style, text: &str) -> String {
  format!("{}{}{}", style.render(), text, style.render_reset())
}

/// Human-readable progress on stdout
pub struct TerminalReporter<W: Write> {
  out: W,
  palette: Palette,
  /// `project.package_url` template, `{name}` substituted
  package_url: Option<String>,
  package: Option<String>,
  version: Option<Version>,
  remote_url: Option<String>,
  dry_run: bool,
}

impl TerminalReporter<io::Stdout> {
  /// Reporter on stdout, colored when stdout is a terminal and `NO_COLOR` is unset
  pub fn stdout(package_url: Option<String>) -> Self {
    let color = io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    Self::new(io::stdout(), color, package_url)
  }
}

impl<W: Write> TerminalReporter<W> {
  pub fn new(out: W, color: bool, package_url: Option<String>) -> Self {
    Self {
      out,
      palette: if color { Palette::colored() } else { Palette::plain() },
      package_url,
      package: None,
      version: None,
      remote_url: None,
      dry_run: false,
    }
  }

  #[cfg(test)]
  pub fn into_inner(self) -> W {
    self.out
  }

  fn line(&mut self, text: impl AsRef<str>) {
    // A closed stdout must not abort the release halfway
    let _ = writeln!(self.out, "{}", text.as_ref());
  }

  fn started(&mut self, package: &Option<String>, version: &Option<Version>, branch: &str, plan_id: &str) {
    let name = match (package, version) {
      (Some(p), Some(v)) => format!("{} {}", p, v),
      (Some(p), None) => p.clone(),
      _ => "package".to_string(),
    };
    let header = paint(self.palette.bold, &format!("🚀 Releasing {} from {}", name, branch));
    let plan = paint(self.palette.dim, &format!("(plan {})", plan_id));
    self.line(format!("{} {}", header, plan));
    if self.dry_run {
      self.line("   🔍 Dry-run mode: nothing will be published, committed, tagged or released");
    }
    self.line("");
  }

  fn finished_step(&mut self, record: &StepRecord) {
    let title = record.step.title();
    let duration = paint(self.palette.dim, &format!("({}ms)", record.duration_ms));
    let status = match &record.outcome {
      StepOutcome::Success => format!("{} {} {}", paint(self.palette.ok, "[OK]"), title, duration),
      StepOutcome::Skipped { reason, detail } => {
        let marker = match reason {
          SkipReason::DryRun => "[dry-run]",
          _ => "[-]",
        };
        format!("{} {}: {}", paint(self.palette.dim, marker), title, detail)
      }
      StepOutcome::Tolerated { message, .. } => {
        format!("{} {} failed (continuing): {}", paint(self.palette.warn, "[!]"), title, message)
      }
      StepOutcome::Failed { message, .. } => {
        format!("{} {} failed: {}", paint(self.palette.fail, "[X]"), title, message)
      }
    };
    self.line(status);

    for info in &record.info {
      self.line(format!("    {}", info));
    }
    for action in &record.actions {
      let line = match &action.status {
        ActionStatus::Done => format!("    {} {}", paint(self.palette.ok, "+"), action.description),
        ActionStatus::Skipped { detail } => format!("    - {} ({})", action.description, detail),
        ActionStatus::Planned => format!("    {} would: {}", paint(self.palette.dim, "~"), action.description),
      };
      self.line(line);
    }
    for warning in &record.warnings {
      self.line(format!("    {} {}", paint(self.palette.warn, "⚠️"), warning));
    }
    if (record.outcome.is_failure() || matches!(record.outcome, StepOutcome::Tolerated { .. }))
      && let Some(help) = &record.help
    {
      self.line(format!("    💡 {}", help.replace('\n', "\n       ")));
    }
  }

  fn finished_run(&mut self, status: &RunStatus) {
    self.line("");
    match status {
      RunStatus::Complete if self.dry_run => {
        self.line(paint(self.palette.ok, "✅ Dry run complete. Re-run without --dry-run to release."));
      }
      RunStatus::Complete => {
        self.line(paint(self.palette.ok, "✅ Release complete"));
        for link in self.links() {
          self.line(format!("   {}", link));
        }
      }
      RunStatus::Cancelled { step } => {
        self.line(paint(
          self.palette.warn,
          &format!("🛑 Release cancelled at {} [exit {}]", step, ExitCode::UserCancelled),
        ));
      }
      RunStatus::Failed { exit_code, step } => {
        self.line(paint(
          self.palette.fail,
          &format!("❌ Release stopped at {} [exit {}]", step, exit_code),
        ));
      }
    }
  }

  /// Where to look after a successful release
  fn links(&self) -> Vec<String> {
    let mut links = Vec::new();
    let repo = self.remote_url.as_deref().and_then(github_repo_path);
    if let Some(repo) = &repo {
      links.push(format!("CI:      https://github.com/{}/actions", repo));
    }
    if let (Some(template), Some(package)) = (&self.package_url, &self.package) {
      links.push(format!("Package: {}", template.replace("{name}", package)));
    }
    if let (Some(repo), Some(version)) = (&repo, &self.version) {
      links.push(format!(
        "Release: https://github.com/{}/releases/tag/{}",
        repo,
        version.tag_name()
      ));
    }
    links
  }
}

impl<W: Write> EventSink for TerminalReporter<W> {
  fn emit(&mut self, event: &WorkflowEvent) {
    match event {
      WorkflowEvent::RunStarted {
        package,
        version,
        branch,
        remote_url,
        dry_run,
        plan_id,
      } => {
        self.package = package.clone();
        self.version = *version;
        self.remote_url = remote_url.clone();
        self.dry_run = *dry_run;
        self.started(package, version, branch, plan_id);
      }
      WorkflowEvent::Warning { message } => {
        let marker = paint(self.palette.warn, "⚠️  Warning:");
        self.line(format!("{} {}", marker, message));
        self.line("");
      }
      WorkflowEvent::StepStarted { step } => {
        let marker = paint(self.palette.dim, "[>]");
        self.line(format!("{} {}...", marker, step.title()));
      }
      WorkflowEvent::StepFinished { record } => self.finished_step(record),
      WorkflowEvent::RunFinished { status } => self.finished_run(status),
    }
    let _ = self.out.flush();
  }
}

/// Sink for `--json` runs: events go to the log, stdout is left to the trace
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
  fn emit(&mut self, event: &WorkflowEvent) {
    match serde_json::to_string(event) {
      Ok(json) => tracing::info!(target: "shiprail::events", "{}", json),
      Err(err) => tracing::warn!(error = %err, "could not serialize workflow event"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::ErrorKind;
  use crate::workflow::outcome::ActionRecord;
  use crate::workflow::step::StepId;
  use chrono::Utc;

  fn record(step: StepId, outcome: StepOutcome) -> StepRecord {
    StepRecord {
      step,
      outcome,
      actions: Vec::new(),
      warnings: Vec::new(),
      info: Vec::new(),
      help: None,
      started_at: Utc::now(),
      duration_ms: 3,
    }
  }

  fn started(dry_run: bool) -> WorkflowEvent {
    WorkflowEvent::RunStarted {
      package: Some("demo_pkg".to_string()),
      version: Some(Version::new(1, 2, 0)),
      branch: "main".to_string(),
      remote_url: Some("git@github.com:acme/demo_pkg.git".to_string()),
      dry_run,
      plan_id: "abc123def456".to_string(),
    }
  }

  fn render(events: &[WorkflowEvent]) -> String {
    let mut reporter = TerminalReporter::new(
      Vec::new(),
      false,
      Some("https://pub.dev/packages/{name}".to_string()),
    );
    for event in events {
      reporter.emit(event);
    }
    String::from_utf8(reporter.into_inner()).unwrap()
  }

  #[test]
  fn test_successful_run_prints_links() {
    let mut tag = record(StepId::CreateTag, StepOutcome::Success);
    tag.actions.push(ActionRecord::done("Create tag v1.2.0"));
    let out = render(&[
      started(false),
      WorkflowEvent::StepStarted { step: StepId::CreateTag },
      WorkflowEvent::StepFinished { record: tag },
      WorkflowEvent::RunFinished {
        status: RunStatus::Complete,
      },
    ]);

    assert!(out.contains("🚀 Releasing demo_pkg 1.2.0 from main (plan abc123def456)"));
    assert!(out.contains("[OK] Creating tag (3ms)"));
    assert!(out.contains("+ Create tag v1.2.0"));
    assert!(out.contains("https://github.com/acme/demo_pkg/actions"));
    assert!(out.contains("https://pub.dev/packages/demo_pkg"));
    assert!(out.contains("https://github.com/acme/demo_pkg/releases/tag/v1.2.0"));
  }

  #[test]
  fn test_failure_shows_help_and_exit() {
    let mut failed = record(
      StepId::ValidateChangelog,
      StepOutcome::Failed {
        kind: ErrorKind::VersionMismatch,
        message: "Version mismatch".to_string(),
      },
    );
    failed.help = Some("Update CHANGELOG.md".to_string());
    let out = render(&[
      started(false),
      WorkflowEvent::StepFinished { record: failed },
      WorkflowEvent::RunFinished {
        status: RunStatus::Failed {
          exit_code: ExitCode::ChangelogInvalid,
          step: StepId::ValidateChangelog,
        },
      },
    ]);

    assert!(out.contains("[X] Validating changelog failed: Version mismatch"));
    assert!(out.contains("💡 Update CHANGELOG.md"));
    assert!(out.contains("stopped at validate-changelog [exit changelog-invalid (5)]"));
    assert!(!out.contains("/actions"));
  }

  #[test]
  fn test_dry_run_lists_planned_actions() {
    let mut tag = record(
      StepId::CreateTag,
      StepOutcome::Skipped {
        reason: SkipReason::DryRun,
        detail: "dry run".to_string(),
      },
    );
    tag.actions.push(ActionRecord::planned("Create tag v1.2.0"));
    let out = render(&[
      started(true),
      WorkflowEvent::StepFinished { record: tag },
      WorkflowEvent::RunFinished {
        status: RunStatus::Complete,
      },
    ]);

    assert!(out.contains("Dry-run mode"));
    assert!(out.contains("~ would: Create tag v1.2.0"));
    assert!(out.contains("Dry run complete"));
    assert!(!out.contains("/releases/tag/"));
  }

  #[test]
  fn test_cancelled_run_is_not_reported_as_failure() {
    let out = render(&[
      started(false),
      WorkflowEvent::RunFinished {
        status: RunStatus::Cancelled { step: StepId::Confirm },
      },
    ]);

    assert!(out.contains("🛑 Release cancelled at confirm [exit user-cancelled (10)]"));
    assert!(!out.contains("❌"));
    assert!(!out.contains("/releases/tag/"));
  }
}
