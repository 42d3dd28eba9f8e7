//! Named provider and task declarations.
//!
//! The registry is the static description of a build recipe: every entry is
//! declared once during a registration phase, records the parameter names it
//! depends on, and is immutable afterwards. Resolution and execution borrow
//! the registry, so nothing can be registered once a run has started.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::value::{Args, Value};

/// How an entry behaves during execution.
///
/// Providers produce pure values and are re-evaluated every run; tasks may
/// produce persisted filesystem artifacts and are subject to staleness-based
/// skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
  Provider,
  Task,
}

impl Kind {
  pub fn is_task(self) -> bool {
    matches!(self, Kind::Task)
  }
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Kind::Provider => write!(f, "provider"),
      Kind::Task => write!(f, "task"),
    }
  }
}

/// Failure raised by a run function; carried inside `ExecuteError::Task`.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The function invoked when an entry executes, with its dependencies
/// already resolved.
pub type RunFn = Box<dyn Fn(&Args) -> Result<Value, TaskError> + Send + Sync>;

/// Pure derivation of the file outputs a task will produce from its resolved
/// arguments. This is what lets the executor consult the staleness checker
/// and skip the run function entirely when the outputs are already current.
pub type OutputsFn = Box<dyn Fn(&Args) -> Vec<PathBuf> + Send + Sync>;

/// One declared provider or task.
pub struct RegistryEntry {
  name: String,
  kind: Kind,
  params: Vec<String>,
  default: bool,
  outputs: Option<OutputsFn>,
  run: RunFn,
}

impl RegistryEntry {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn kind(&self) -> Kind {
    self.kind
  }

  /// Declared parameter names, in declaration order. Each names another
  /// registry entry this one depends on.
  pub fn params(&self) -> &[String] {
    &self.params
  }

  pub fn is_default(&self) -> bool {
    self.default
  }

  /// Whether this task declares file outputs and can be skipped as up to
  /// date.
  pub fn is_file_backed(&self) -> bool {
    self.outputs.is_some()
  }

  pub(crate) fn declared_outputs(&self, args: &Args) -> Option<Vec<PathBuf>> {
    self.outputs.as_ref().map(|f| f(args))
  }

  pub(crate) fn invoke(&self, args: &Args) -> Result<Value, TaskError> {
    (self.run)(args)
  }
}

impl fmt::Debug for RegistryEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RegistryEntry")
      .field("name", &self.name)
      .field("kind", &self.kind)
      .field("params", &self.params)
      .field("default", &self.default)
      .field("file_backed", &self.outputs.is_some())
      .finish()
  }
}

/// Errors raised while declaring a recipe.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
  /// An entry with this name already exists.
  #[error("an entry named '{0}' is already registered")]
  DuplicateName(String),

  /// A default task is already marked.
  #[error("cannot mark '{new}' as the default task: '{existing}' already is")]
  DuplicateDefault { existing: String, new: String },

  /// `set_default` named an entry that was never registered.
  #[error("cannot mark unknown entry '{0}' as the default task")]
  UnknownEntry(String),

  /// Only tasks may be the default target.
  #[error("'{0}' is a provider and cannot be the default task")]
  DefaultIsProvider(String),
}

/// All declared providers and tasks, keyed by name.
///
/// Declaration order is preserved for listing and for resolution tie-breaks.
#[derive(Debug, Default)]
pub struct Registry {
  entries: Vec<RegistryEntry>,
  index: HashMap<String, usize>,
  default: Option<usize>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declare a provider: a pure value producer, re-evaluated every run.
  pub fn provide<F>(&mut self, name: &str, params: &[&str], run: F) -> Result<(), RegistryError>
  where
    F: Fn(&Args) -> Result<Value, TaskError> + Send + Sync + 'static,
  {
    self.insert(RegistryEntry {
      name: name.to_string(),
      kind: Kind::Provider,
      params: params.iter().map(|p| p.to_string()).collect(),
      default: false,
      outputs: None,
      run: Box::new(run),
    })
  }

  /// Declare a pure task: a build step with no durable file outputs, so it
  /// always re-runs.
  pub fn task<F>(&mut self, name: &str, params: &[&str], run: F) -> Result<(), RegistryError>
  where
    F: Fn(&Args) -> Result<Value, TaskError> + Send + Sync + 'static,
  {
    self.insert(RegistryEntry {
      name: name.to_string(),
      kind: Kind::Task,
      params: params.iter().map(|p| p.to_string()).collect(),
      default: false,
      outputs: None,
      run: Box::new(run),
    })
  }

  /// Declare a file-backed task. `outputs` derives the files the task will
  /// write from its resolved arguments; when those files are already up to
  /// date with respect to the task's inputs, `run` is not invoked.
  pub fn file_task<O, F>(
    &mut self,
    name: &str,
    params: &[&str],
    outputs: O,
    run: F,
  ) -> Result<(), RegistryError>
  where
    O: Fn(&Args) -> Vec<PathBuf> + Send + Sync + 'static,
    F: Fn(&Args) -> Result<Value, TaskError> + Send + Sync + 'static,
  {
    self.insert(RegistryEntry {
      name: name.to_string(),
      kind: Kind::Task,
      params: params.iter().map(|p| p.to_string()).collect(),
      default: false,
      outputs: Some(Box::new(outputs)),
      run: Box::new(run),
    })
  }

  /// Mark a registered task as the default build target.
  pub fn set_default(&mut self, name: &str) -> Result<(), RegistryError> {
    if let Some(existing) = self.default_task() {
      return Err(RegistryError::DuplicateDefault {
        existing: existing.name().to_string(),
        new: name.to_string(),
      });
    }
    let idx = *self
      .index
      .get(name)
      .ok_or_else(|| RegistryError::UnknownEntry(name.to_string()))?;
    if !self.entries[idx].kind.is_task() {
      return Err(RegistryError::DefaultIsProvider(name.to_string()));
    }
    self.entries[idx].default = true;
    self.default = Some(idx);
    Ok(())
  }

  fn insert(&mut self, entry: RegistryEntry) -> Result<(), RegistryError> {
    if self.index.contains_key(&entry.name) {
      return Err(RegistryError::DuplicateName(entry.name));
    }
    self.index.insert(entry.name.clone(), self.entries.len());
    self.entries.push(entry);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
    self.index.get(name).map(|&idx| &self.entries[idx])
  }

  /// The task marked default, if any.
  pub fn default_task(&self) -> Option<&RegistryEntry> {
    self.default.map(|idx| &self.entries[idx])
  }

  /// All entries, in declaration order.
  pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
    self.entries.iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn unit(_: &Args) -> Result<Value, TaskError> {
    Ok(Value::Unit)
  }

  #[test]
  fn provider_and_task_kinds() {
    let mut registry = Registry::new();
    registry.provide("sources", &[], unit).unwrap();
    registry.task("check", &["sources"], unit).unwrap();

    assert_eq!(registry.get("sources").unwrap().kind(), Kind::Provider);
    assert_eq!(registry.get("check").unwrap().kind(), Kind::Task);
    assert!(!registry.get("check").unwrap().is_file_backed());
  }

  #[test]
  fn duplicate_name_rejected() {
    let mut registry = Registry::new();
    registry.provide("sources", &[], unit).unwrap();

    let err = registry.task("sources", &[], unit).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateName("sources".to_string()));
  }

  #[test]
  fn declaration_order_preserved() {
    let mut registry = Registry::new();
    registry.provide("b", &[], unit).unwrap();
    registry.provide("a", &[], unit).unwrap();
    registry.task("c", &["a", "b"], unit).unwrap();

    let names: Vec<&str> = registry.entries().map(|e| e.name()).collect();
    assert_eq!(names, vec!["b", "a", "c"]);
  }

  #[test]
  fn default_task_marking() {
    let mut registry = Registry::new();
    registry.task("build", &[], unit).unwrap();
    assert!(registry.default_task().is_none());

    registry.set_default("build").unwrap();
    assert_eq!(registry.default_task().unwrap().name(), "build");
    assert!(registry.get("build").unwrap().is_default());
  }

  #[test]
  fn second_default_rejected() {
    let mut registry = Registry::new();
    registry.task("build", &[], unit).unwrap();
    registry.task("test", &[], unit).unwrap();
    registry.set_default("build").unwrap();

    let err = registry.set_default("test").unwrap_err();
    assert_eq!(
      err,
      RegistryError::DuplicateDefault {
        existing: "build".to_string(),
        new: "test".to_string(),
      }
    );
  }

  #[test]
  fn default_must_be_registered_task() {
    let mut registry = Registry::new();
    registry.provide("sources", &[], unit).unwrap();

    assert_eq!(
      registry.set_default("missing").unwrap_err(),
      RegistryError::UnknownEntry("missing".to_string())
    );
    assert_eq!(
      registry.set_default("sources").unwrap_err(),
      RegistryError::DefaultIsProvider("sources".to_string())
    );
  }

  #[test]
  fn file_task_is_file_backed() {
    let mut registry = Registry::new();
    registry
      .file_task("objects", &[], |_: &Args| vec![PathBuf::from("a.o")], unit)
      .unwrap();

    let entry = registry.get("objects").unwrap();
    assert!(entry.is_file_backed());

    let args = Args::new(vec![]);
    assert_eq!(entry.declared_outputs(&args), Some(vec![PathBuf::from("a.o")]));
  }
}
