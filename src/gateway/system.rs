//! System process backend for the tool gateway

use super::{ToolCommand, ToolGateway, ToolOutput};
use crate::core::error::{ShipError, ShipResult};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::debug;

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGateway;

impl SystemGateway {
  pub fn new() -> Self {
    Self
  }
}

impl ToolGateway for SystemGateway {
  fn invoke(&self, command: &ToolCommand, cwd: &Path) -> ShipResult<ToolOutput> {
    let mut cmd = self.build_command(command);
    cmd.current_dir(cwd);

    let started = Instant::now();
    let output = cmd
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .output()
      .map_err(|source| ShipError::ToolSpawn {
        program: command.program.clone(),
        source,
      })?;
    let output = ToolOutput {
      exit_code: output.status.code().unwrap_or(-1),
      // Undecodable bytes are replaced rather than failing the step
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    debug!(
      command = %command,
      cwd = %cwd.display(),
      exit_code = output.exit_code,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "tool invocation finished"
    );

    Ok(output)
  }

  fn locate(&self, program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
      return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| find_in_dir(&dir, program))
  }
}

impl SystemGateway {
  /// Only batch shims (flutter.bat) go through `cmd /C`; everything else is
  /// spawned directly so arguments never meet cmd.exe's parser
  #[cfg(windows)]
  fn build_command(&self, command: &ToolCommand) -> Command {
    let mut cmd = match self.locate(&command.program) {
      Some(path) if is_batch_script(&path) => {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(path);
        cmd
      }
      Some(path) => Command::new(path),
      None => Command::new(&command.program),
    };
    cmd.args(&command.args);
    cmd
  }

  #[cfg(not(windows))]
  fn build_command(&self, command: &ToolCommand) -> Command {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);
    cmd
  }
}

#[cfg(any(windows, test))]
fn is_batch_script(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("bat") || ext.eq_ignore_ascii_case("cmd"))
}

#[cfg(windows)]
fn find_in_dir(dir: &Path, program: &str) -> Option<PathBuf> {
  let exts = env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
  std::iter::once(String::new())
    .chain(exts.split(';').filter(|e| !e.is_empty()).map(str::to_string))
    .map(|ext| dir.join(format!("{}{}", program, ext)))
    .find(|path| is_executable(path))
}

#[cfg(not(windows))]
fn find_in_dir(dir: &Path, program: &str) -> Option<PathBuf> {
  let path = dir.join(program);
  is_executable(&path).then_some(path)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;
  path
    .metadata()
    .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_locate_finds_git() {
    // git is required by every integration test as well
    assert!(SystemGateway::new().locate("git").is_some());
  }

  #[test]
  fn test_locate_missing_program() {
    assert!(SystemGateway::new().locate("shiprail-definitely-not-installed").is_none());
  }

  #[test]
  fn test_nonzero_exit_is_data() {
    let dir = tempfile::tempdir().unwrap();
    let output = SystemGateway::new()
      .invoke(&ToolCommand::new("git").args(["rev-parse", "--verify", "no-such-ref"]), dir.path())
      .unwrap();
    assert!(!output.success());
    assert!(!output.stderr.is_empty());
  }

  #[test]
  fn test_spawn_failure_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = SystemGateway::new().invoke(&ToolCommand::new("shiprail-definitely-not-installed"), dir.path());
    assert!(matches!(result, Err(ShipError::ToolSpawn { .. })));
  }

  #[test]
  fn test_only_batch_scripts_need_cmd() {
    assert!(is_batch_script(Path::new(r"C:\flutter\bin\flutter.bat")));
    assert!(is_batch_script(Path::new("dart.CMD")));
    assert!(!is_batch_script(Path::new(r"C:\Program Files\GitHub CLI\gh.exe")));
    assert!(!is_batch_script(Path::new("/usr/bin/git")));
  }
}
