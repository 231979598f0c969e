//! History command: commit log for a date range, written to a file

use crate::core::context::ProjectContext;
use crate::core::error::{ResultExt, ShipError, ShipResult};
use crate::core::vcs::Git;
use crate::gateway::SystemGateway;
use chrono::{Days, Local, NaiveDate};
use std::fs;
use std::path::PathBuf;

/// Start of the default range
pub const DEFAULT_SINCE: &str = "2024-10-01";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Resolved date range and output file
#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryRange {
  since: NaiveDate,
  until: NaiveDate,
}

impl HistoryRange {
  /// Defaults: since 2024-10-01, until tomorrow (so today's commits are included)
  fn resolve(since: Option<&str>, until: Option<&str>, today: NaiveDate) -> ShipResult<Self> {
    let since = parse_date("--since", since.unwrap_or(DEFAULT_SINCE))?;
    let until = match until {
      Some(raw) => parse_date("--until", raw)?,
      None => today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| ShipError::message("Date out of range"))?,
    };
    if since > until {
      return Err(ShipError::with_help(
        format!("--since {} is after --until {}", since, until),
        "Swap the dates or widen the range",
      ));
    }
    Ok(Self { since, until })
  }

  fn default_file_name(&self) -> String {
    format!("commit_details_{}-{}.log", self.since, self.until)
  }
}

fn parse_date(flag: &str, raw: &str) -> ShipResult<NaiveDate> {
  NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
    ShipError::with_help(
      format!("Invalid {} date '{}'", flag, raw),
      "Use YYYY-MM-DD, e.g. 2024-10-01",
    )
  })
}

/// Write `git log` for the range to `output` (default `commit_details_<since>-<until>.log`)
pub fn run_history(
  ctx: &ProjectContext,
  since: Option<String>,
  until: Option<String>,
  output: Option<PathBuf>,
) -> ShipResult<()> {
  let range = HistoryRange::resolve(since.as_deref(), until.as_deref(), Local::now().date_naive())?;
  let output = output.unwrap_or_else(|| PathBuf::from(range.default_file_name()));
  let output = if output.is_absolute() { output } else { ctx.path(&output) };

  println!("Fetching commits from {} to {}", range.since, range.until);

  let gateway = SystemGateway::new();
  let git = Git::new(&gateway, &ctx.root, &ctx.config.project.remote);
  let log = git.log_between(&range.since.to_string(), &range.until.to_string())?;

  fs::write(&output, &log).with_context(|| format!("Failed to write {}", output.display()))?;

  if log.trim().is_empty() {
    println!("⚠️  No commits found in the specified date range");
  } else {
    println!("✅ Commits logged to {}", output.display());
  }
  Ok(())
}
