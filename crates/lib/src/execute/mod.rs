//! Build execution.
//!
//! Walks a resolved dependency order, invoking each entry's run function at
//! most once per run. Argument values are gathered from the per-run record,
//! which the topological order guarantees is already populated. File-backed
//! tasks consult the staleness checker first: when their declared outputs
//! are current, the result artifact is synthesized from the existing files
//! and the run function is never invoked.

pub mod types;

use std::time::{Instant, SystemTime};

use tracing::{debug, info};

use crate::registry::{Registry, RegistryEntry};
use crate::resolve::DependencyGraph;
use crate::stale;
use crate::value::{Args, Artifact, Value};

pub use types::{ExecuteConfig, ExecuteError, NodeOutcome, NodeRecord, RunOutcome, RunRecord, RunSummary};

/// Run a target by name, or the default task when `target` is `None`.
///
/// This is the main entry point: it selects the target, resolves the
/// dependency graph, and executes the resulting order.
pub fn run_target(
  registry: &Registry,
  target: Option<&str>,
  config: &ExecuteConfig,
) -> Result<RunOutcome, ExecuteError> {
  let target = match target {
    Some(name) => name,
    None => registry.default_task().ok_or(ExecuteError::NoDefaultTask)?.name(),
  };

  let graph = DependencyGraph::resolve(registry, target)?;
  execute(&graph, config)
}

/// Execute a resolved order and return the target's value with the run
/// summary.
///
/// Execution is fail-fast: the first run-function failure aborts the
/// remaining order. Artifacts produced before the failure stay on disk, so
/// the next run's staleness checks skip the already-successful steps.
pub fn execute(graph: &DependencyGraph, config: &ExecuteConfig) -> Result<RunOutcome, ExecuteError> {
  let started = Instant::now();
  let target = graph.target().name();
  info!(requested = target, nodes = graph.len(), "starting build run");

  let mut record = RunRecord::default();
  let mut executed = Vec::new();
  let mut up_to_date = Vec::new();

  for entry in graph.order() {
    // Memoization: a diamond dependency reaches its shared node once.
    if record.contains(entry.name()) {
      continue;
    }
    match run_entry(entry, graph, &mut record, config)? {
      NodeOutcome::Executed => executed.push(entry.name().to_string()),
      NodeOutcome::UpToDate => up_to_date.push(entry.name().to_string()),
    }
  }

  let value = record
    .get(target)
    .expect("the target is the last entry of the order")
    .value
    .clone();

  info!(
    requested = target,
    executed = executed.len(),
    up_to_date = up_to_date.len(),
    "build run complete"
  );

  Ok(RunOutcome {
    value,
    summary: RunSummary {
      target: target.to_string(),
      executed,
      up_to_date,
      elapsed_ms: started.elapsed().as_millis() as u64,
    },
  })
}

fn run_entry(
  entry: &RegistryEntry,
  graph: &DependencyGraph,
  record: &mut RunRecord,
  config: &ExecuteConfig,
) -> Result<NodeOutcome, ExecuteError> {
  let name = entry.name();

  // Gather resolved argument values; topological order guarantees presence.
  let mut values = Vec::with_capacity(entry.params().len());
  for param in entry.params() {
    let dep = record
      .get(param)
      .expect("dependencies precede dependents in the order");
    values.push((param.as_str(), &dep.value));
  }
  let args = Args::new(values);

  if entry.kind().is_task()
    && let Some(outputs) = entry.declared_outputs(&args)
  {
    let dependency_rebuilt = graph
      .dependencies(name)
      .iter()
      .any(|dep| record.get(dep).is_some_and(|r| r.fresh));
    let inputs = args.file_paths();

    if config.force {
      debug!(task = name, "forced re-run");
    } else {
      match stale::check(&outputs, &inputs, dependency_rebuilt) {
        None => {
          info!(task = name, "up to date");
          drop(args);
          record.insert(
            name,
            NodeRecord {
              value: Value::Artifact(Artifact::new(outputs, inputs)),
              finished_at: SystemTime::now(),
              invoked: false,
              fresh: false,
            },
          );
          return Ok(NodeOutcome::UpToDate);
        }
        Some(reason) => debug!(task = name, %reason, "stale"),
      }
    }
  }

  debug!(entry = name, kind = %entry.kind(), "invoking");
  let value = entry.invoke(&args).map_err(|source| ExecuteError::Task {
    name: name.to_string(),
    source,
  })?;
  drop(args);

  record.insert(
    name,
    NodeRecord {
      value,
      finished_at: SystemTime::now(),
      invoked: true,
      fresh: entry.is_file_backed(),
    },
  );
  Ok(NodeOutcome::Executed)
}
