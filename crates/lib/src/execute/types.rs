//! Types for build execution.
//!
//! This module defines the executor's configuration, the per-run record of
//! resolved values, the run summary, and the execution error type.

use std::collections::HashMap;
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;

use crate::registry::TaskError;
use crate::resolve::ResolveError;
use crate::value::Value;

/// Errors that can occur while selecting or executing a target.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// Resolution failed before anything executed.
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  /// No target was named and no task is marked default.
  #[error("no target named and no default task is registered")]
  NoDefaultTask,

  /// A run function failed; execution aborts at the first failure.
  #[error("task '{name}' failed: {source}")]
  Task {
    name: String,
    #[source]
    source: TaskError,
  },
}

impl ExecuteError {
  /// Name of the failing entry, when the error came from a run function.
  pub fn task_name(&self) -> Option<&str> {
    match self {
      ExecuteError::Task { name, .. } => Some(name),
      _ => None,
    }
  }
}

/// Configuration for a build run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteConfig {
  /// Re-run every node even when its outputs are up to date.
  pub force: bool,
}

/// What happened to one entry during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeOutcome {
  /// The run function was invoked.
  Executed,
  /// A file-backed task whose outputs were already current; its artifact was
  /// synthesized from the existing files.
  UpToDate,
}

/// Per-entry record for one build run.
#[derive(Debug)]
pub struct NodeRecord {
  pub value: Value,
  pub finished_at: SystemTime,

  /// Whether the run function was actually invoked (false when the entry was
  /// skipped as up to date).
  pub invoked: bool,

  /// Whether this entry re-made file outputs this run. Drives staleness
  /// propagation to its dependents; providers and pure tasks never set it.
  pub fresh: bool,
}

/// The per-run memo of resolved values.
///
/// Created empty at run start, populated as nodes execute, discarded at run
/// end. The on-disk artifact timestamps the staleness checker reads are the
/// only state that outlives a run.
#[derive(Debug, Default)]
pub struct RunRecord {
  records: HashMap<String, NodeRecord>,
}

impl RunRecord {
  pub fn contains(&self, name: &str) -> bool {
    self.records.contains_key(name)
  }

  pub fn get(&self, name: &str) -> Option<&NodeRecord> {
    self.records.get(name)
  }

  pub fn insert(&mut self, name: &str, record: NodeRecord) {
    self.records.insert(name.to_string(), record);
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

/// Summary of one build run: which entries executed and which were skipped
/// as up to date, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
  pub target: String,
  pub executed: Vec<String>,
  pub up_to_date: Vec<String>,
  pub elapsed_ms: u64,
}

impl RunSummary {
  /// Whether the named entry's run function was invoked this run.
  pub fn ran(&self, name: &str) -> bool {
    self.executed.iter().any(|n| n == name)
  }

  /// Total entries the run visited.
  pub fn total(&self) -> usize {
    self.executed.len() + self.up_to_date.len()
  }
}

/// Result of a successful run: the target's value plus the run summary.
#[derive(Debug)]
pub struct RunOutcome {
  pub value: Value,
  pub summary: RunSummary,
}
