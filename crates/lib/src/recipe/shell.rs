//! Synchronous external command execution.
//!
//! Build steps shell out to the toolchain and wait; step latency dominates
//! orchestration overhead, so there is no async runtime here. Stdio is
//! inherited so compiler diagnostics reach the terminal unmodified.

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::env::Environment;

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum ShellError {
  /// The command ran and exited nonzero.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CommandFailed { cmd: String, code: Option<i32> },

  /// The command could not be spawned at all.
  #[error("failed to spawn '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },
}

/// Run a program to completion.
///
/// The environment's variables are layered over the inherited process
/// environment; everything else passes through.
pub fn run(program: &str, args: &[String], env: &Environment, cwd: Option<&Path>) -> Result<(), ShellError> {
  let mut cmd = Command::new(program);
  cmd.args(args);
  env.apply_to(&mut cmd);
  if let Some(dir) = cwd {
    cmd.current_dir(dir);
  }

  let rendered = render(program, args);
  debug!(cmd = %rendered, "running");

  let status = cmd.status().map_err(|source| ShellError::Spawn {
    cmd: rendered.clone(),
    source,
  })?;

  if !status.success() {
    return Err(ShellError::CommandFailed {
      cmd: rendered,
      code: status.code(),
    });
  }
  Ok(())
}

fn render(program: &str, args: &[String]) -> String {
  let mut rendered = String::from(program);
  for arg in args {
    rendered.push(' ');
    rendered.push_str(arg);
  }
  rendered
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_joins_program_and_args() {
    assert_eq!(
      render("c++", &["-c".to_string(), "main.cc".to_string()]),
      "c++ -c main.cc"
    );
    assert_eq!(render("c++", &[]), "c++");
  }

  #[cfg(unix)]
  #[test]
  fn successful_command() {
    run("/usr/bin/true", &[], &Environment::new(), None).unwrap();
  }

  #[cfg(unix)]
  #[test]
  fn failing_command_reports_exit_code() {
    let err = run("/usr/bin/false", &[], &Environment::new(), None).unwrap_err();
    match err {
      ShellError::CommandFailed { code, .. } => assert_eq!(code, Some(1)),
      other => panic!("expected CommandFailed, got {other:?}"),
    }
  }

  #[cfg(unix)]
  #[test]
  fn missing_program_reports_spawn_failure() {
    let err = run("/no/such/compiler", &[], &Environment::new(), None).unwrap_err();
    assert!(matches!(err, ShellError::Spawn { .. }));
  }

  #[cfg(unix)]
  #[test]
  fn environment_is_applied() {
    let mut env = Environment::new();
    env.set("GIRDER_SHELL_TEST", "1");
    // sh -c 'test "$GIRDER_SHELL_TEST" = 1'
    run(
      "/bin/sh",
      &["-c".to_string(), "test \"$GIRDER_SHELL_TEST\" = 1".to_string()],
      &env,
      None,
    )
    .unwrap();
  }
}
