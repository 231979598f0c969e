//! Scripted gateway for tests
//!
//! Responses are matched by command prefix (`"git tag -l"`); the longest
//! matching prefix wins. Unmatched commands succeed with empty output. Every
//! invocation is recorded so tests can assert call counts.

use super::{ToolCommand, ToolGateway, ToolOutput};
use crate::core::error::ShipResult;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

type Handler = Box<dyn Fn(&ToolCommand) -> ToolOutput>;

struct Rule {
  prefix: Vec<String>,
  handler: Handler,
}

#[derive(Default)]
pub struct FakeGateway {
  rules: RefCell<Vec<Rule>>,
  calls: RefCell<Vec<ToolCommand>>,
  missing: RefCell<HashSet<String>>,
}

impl FakeGateway {
  pub fn new() -> Self {
    Self::default()
  }

  /// Answer commands starting with `prefix` with a fixed output
  pub fn on(&self, prefix: &str, output: ToolOutput) -> &Self {
    self.on_with(prefix, move |_| output.clone())
  }

  /// Answer commands starting with `prefix` with a computed output
  pub fn on_with(&self, prefix: &str, handler: impl Fn(&ToolCommand) -> ToolOutput + 'static) -> &Self {
    let prefix = prefix.split_whitespace().map(str::to_string).collect();
    self.rules.borrow_mut().push(Rule {
      prefix,
      handler: Box::new(handler),
    });
    self
  }

  /// Make `locate` report the program as not installed
  pub fn without_tool(&self, program: &str) -> &Self {
    self.missing.borrow_mut().insert(program.to_string());
    self
  }

  /// Every invocation so far, rendered as command lines
  pub fn calls(&self) -> Vec<String> {
    self.calls.borrow().iter().map(ToString::to_string).collect()
  }

  /// Number of invocations starting with `prefix`
  pub fn count(&self, prefix: &str) -> usize {
    let prefix: Vec<&str> = prefix.split_whitespace().collect();
    self.calls.borrow().iter().filter(|c| c.starts_with(&prefix)).count()
  }
}

impl ToolGateway for FakeGateway {
  fn invoke(&self, command: &ToolCommand, _cwd: &Path) -> ShipResult<ToolOutput> {
    self.calls.borrow_mut().push(command.clone());

    let rules = self.rules.borrow();
    // max_by_key keeps the last maximum, so later registrations win ties
    let best = rules
      .iter()
      .filter(|rule| {
        let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
        command.starts_with(&prefix)
      })
      .max_by_key(|rule| rule.prefix.len());
    let output = match best {
      Some(rule) => (rule.handler)(command),
      None => ToolOutput::ok(""),
    };
    Ok(output)
  }

  fn locate(&self, program: &str) -> Option<PathBuf> {
    if self.missing.borrow().contains(program) {
      None
    } else {
      Some(PathBuf::from("/usr/bin").join(program))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_longest_prefix_wins() {
    let fake = FakeGateway::new();
    fake.on("git", ToolOutput::ok("generic"));
    fake.on("git tag -l", ToolOutput::ok("specific"));
    let out = fake
      .invoke(&ToolCommand::new("git").args(["tag", "-l", "v1"]), Path::new("."))
      .unwrap();
    assert_eq!(out.stdout, "specific");
    let out = fake
      .invoke(&ToolCommand::new("git").args(["status"]), Path::new("."))
      .unwrap();
    assert_eq!(out.stdout, "generic");
  }

  #[test]
  fn test_counts_calls() {
    let fake = FakeGateway::new();
    for _ in 0..2 {
      fake.invoke(&ToolCommand::new("gh").args(["release", "view"]), Path::new(".")).unwrap();
    }
    assert_eq!(fake.count("gh release"), 2);
    assert_eq!(fake.count("gh release create"), 0);
  }

  #[test]
  fn test_missing_tool() {
    let fake = FakeGateway::new();
    fake.without_tool("gh");
    assert!(fake.locate("gh").is_none());
    assert!(fake.locate("git").is_some());
  }
}
