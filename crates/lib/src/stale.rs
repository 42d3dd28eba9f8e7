//! Staleness decisions for file-backed tasks.
//!
//! A task's declared outputs are compared against its resolved input paths
//! using ordinary filesystem modification times; nothing else is persisted
//! between runs. Freshness also propagates forward: a task whose dependency
//! re-ran this run must re-run even when timestamps alone would not show it,
//! because a rebuilt input can carry a timestamp older than the output.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Why a task must re-run. `None` from [`check`] means its outputs are up to
/// date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
  /// The task declares no durable outputs, so there is nothing to compare.
  NoOutputs,

  /// A direct dependency re-made its outputs this run.
  DependencyRebuilt,

  /// A declared output does not exist on disk.
  MissingOutput(PathBuf),

  /// A declared input does not exist on disk.
  MissingInput(PathBuf),

  /// A declared output is older than one of the inputs.
  OutdatedOutput { output: PathBuf, input: PathBuf },
}

impl fmt::Display for StaleReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StaleReason::NoOutputs => write!(f, "no declared outputs"),
      StaleReason::DependencyRebuilt => write!(f, "a dependency was rebuilt this run"),
      StaleReason::MissingOutput(path) => write!(f, "output missing: {}", path.display()),
      StaleReason::MissingInput(path) => write!(f, "input missing: {}", path.display()),
      StaleReason::OutdatedOutput { output, input } => write!(
        f,
        "{} is older than {}",
        output.display(),
        input.display()
      ),
    }
  }
}

/// Decide whether a task with the given declared outputs and resolved input
/// paths must re-run.
///
/// Outputs equal in age to their inputs count as up to date; rebuilding on
/// equality would loop forever on filesystems with coarse timestamps.
pub fn check(outputs: &[PathBuf], inputs: &[PathBuf], dependency_rebuilt: bool) -> Option<StaleReason> {
  if outputs.is_empty() {
    return Some(StaleReason::NoOutputs);
  }
  if dependency_rebuilt {
    return Some(StaleReason::DependencyRebuilt);
  }

  let mut oldest: Option<(SystemTime, &PathBuf)> = None;
  for output in outputs {
    match mtime(output) {
      None => return Some(StaleReason::MissingOutput(output.clone())),
      Some(time) => {
        if oldest.is_none_or(|(t, _)| time < t) {
          oldest = Some((time, output));
        }
      }
    }
  }
  let (oldest_time, oldest_output) = oldest.expect("outputs is non-empty");

  for input in inputs {
    match mtime(input) {
      None => return Some(StaleReason::MissingInput(input.clone())),
      Some(time) if time > oldest_time => {
        return Some(StaleReason::OutdatedOutput {
          output: oldest_output.clone(),
          input: input.clone(),
        });
      }
      Some(_) => {}
    }
  }

  None
}

fn mtime(path: &Path) -> Option<SystemTime> {
  fs::metadata(path).and_then(|m| m.modified()).ok()
}
