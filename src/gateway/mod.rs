//! External tool gateway
//!
//! Every external program shiprail runs (git, the release CLI, formatters, test
//! runners, publishers) goes through [`ToolGateway`]. Invocations are synchronous
//! and blocking, with no retry and no timeout. A non-zero exit status is returned
//! as data in [`ToolOutput`]; only a failure to start the program is an error.
//! Callers decide whether a non-zero exit is fatal or a warning.
//!
//! - **system**: real processes via `std::process::Command`
//! - **fake**: scripted responses and call recording for tests

#[cfg(test)]
pub mod fake;
pub mod system;

pub use system::SystemGateway;

use crate::core::error::{ConfigError, ShipResult};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCommand {
  pub program: String,
  pub args: Vec<String>,
}

impl ToolCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  /// Append one argument
  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  /// Append several arguments
  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Build from a configured argv (`["flutter", "test"]`)
  pub fn from_argv(field: &str, argv: &[String]) -> ShipResult<Self> {
    let (program, args) = argv.split_first().ok_or_else(|| ConfigError::Invalid {
      field: field.to_string(),
      reason: "command must name a program".to_string(),
    })?;
    Ok(Self::new(program.clone()).args(args.iter().cloned()))
  }

  /// Whether this command starts with the given program and leading arguments
  #[cfg(test)]
  pub fn starts_with(&self, argv: &[&str]) -> bool {
    match argv.split_first() {
      Some((program, args)) => {
        self.program == *program && args.len() <= self.args.len() && args.iter().zip(&self.args).all(|(a, b)| a == b)
      }
      None => true,
    }
  }
}

impl fmt::Display for ToolCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      if arg.is_empty() || arg.contains(char::is_whitespace) {
        write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}

/// Exit status and captured output of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
  /// Process exit code (-1 when terminated by a signal)
  pub exit_code: i32,
  pub stdout: String,
  pub stderr: String,
}

impl ToolOutput {
  /// Successful invocation with the given stdout
  #[cfg(test)]
  pub fn ok(stdout: impl Into<String>) -> Self {
    Self {
      exit_code: 0,
      stdout: stdout.into(),
      stderr: String::new(),
    }
  }

  /// Failed invocation with the given exit code and stderr
  #[cfg(test)]
  pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
    Self {
      exit_code,
      stdout: String::new(),
      stderr: stderr.into(),
    }
  }

  pub fn success(&self) -> bool {
    self.exit_code == 0
  }

  /// stdout followed by stderr, for error messages and signature matching
  pub fn combined(&self) -> String {
    match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
      (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
      (false, true) => self.stdout.trim_end().to_string(),
      (true, false) => self.stderr.trim_end().to_string(),
      (true, true) => String::new(),
    }
  }
}

/// Uniform synchronous invocation of external commands
pub trait ToolGateway {
  /// Run `command` in `cwd` with stdin closed and output captured, and wait for it to exit
  ///
  /// A non-zero exit is data in the returned output, not an error.
  fn invoke(&self, command: &ToolCommand, cwd: &Path) -> ShipResult<ToolOutput>;

  /// Resolve a program name to an executable path, if it can be found
  fn locate(&self, program: &str) -> Option<PathBuf>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_quotes_arguments_with_spaces() {
    let cmd = ToolCommand::new("git").args(["commit", "-m", "Release v1.0.0"]);
    assert_eq!(cmd.to_string(), "git commit -m \"Release v1.0.0\"");
  }

  #[test]
  fn test_from_argv_requires_program() {
    assert!(ToolCommand::from_argv("gates.test", &[]).is_err());
    let cmd = ToolCommand::from_argv("gates.test", &["flutter".to_string(), "test".to_string()]).unwrap();
    assert_eq!(cmd.program, "flutter");
    assert_eq!(cmd.args, vec!["test"]);
  }

  #[test]
  fn test_starts_with() {
    let cmd = ToolCommand::new("git").args(["tag", "-l", "v1.0.0"]);
    assert!(cmd.starts_with(&["git", "tag"]));
    assert!(cmd.starts_with(&["git", "tag", "-l", "v1.0.0"]));
    assert!(!cmd.starts_with(&["git", "tag", "-a"]));
    assert!(!cmd.starts_with(&["gh"]));
  }

  #[test]
  fn test_combined_output() {
    let out = ToolOutput {
      exit_code: 1,
      stdout: "out\n".to_string(),
      stderr: "err\n".to_string(),
    };
    assert_eq!(out.combined(), "out\nerr");
    assert_eq!(ToolOutput::failed(1, "only err").combined(), "only err");
  }
}
