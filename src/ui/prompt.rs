//! Operator confirmation checkpoints
//!
//! The workflow suspends only here. Questions go to stderr so `--json` output on
//! stdout stays machine-readable.

use crate::core::error::{ResultExt, ShipResult};
use std::io::{self, BufRead, Write};

/// Answers yes/no questions at confirmation checkpoints
pub trait Operator {
  /// Ask `question`, showing `details` first; `true` means proceed
  fn confirm(&self, question: &str, details: &[String]) -> ShipResult<bool>;
}

/// Interactive operator reading answers from stdin
///
/// Anything but an answer starting with `y` (including end of input) is a no.
#[derive(Debug, Default)]
pub struct TerminalOperator;

impl Operator for TerminalOperator {
  fn confirm(&self, question: &str, details: &[String]) -> ShipResult<bool> {
    let mut stderr = io::stderr().lock();
    for line in details {
      writeln!(stderr, "      {}", line)?;
    }
    write!(stderr, "  {} [y/N] ", question)?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin()
      .lock()
      .read_line(&mut answer)
      .context("Failed to read confirmation from stdin")?;
    Ok(is_yes(&answer))
  }
}

/// Operator for `--yes`: every checkpoint proceeds
#[derive(Debug, Default)]
pub struct AutoConfirm;

impl Operator for AutoConfirm {
  fn confirm(&self, question: &str, _details: &[String]) -> ShipResult<bool> {
    tracing::info!(question, "auto-confirmed");
    Ok(true)
  }
}

fn is_yes(answer: &str) -> bool {
  answer.trim().to_lowercase().starts_with('y')
}
