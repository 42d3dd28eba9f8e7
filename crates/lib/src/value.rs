//! Values exchanged between providers and tasks.
//!
//! Every registry entry returns a `Value`. Scalar variants carry plain data
//! (strings, paths, environments); `Artifact` is the file-backed variant a
//! task returns to describe what it produced and what it consumed, so the
//! staleness checker can reason about it on the next run.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::env::Environment;

/// A file-backed result produced by a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifact {
  /// Paths this task wrote.
  pub outputs: Vec<PathBuf>,

  /// Paths this task read to produce the outputs.
  pub inputs: Vec<PathBuf>,
}

impl Artifact {
  pub fn new(outputs: Vec<PathBuf>, inputs: Vec<PathBuf>) -> Self {
    Self { outputs, inputs }
  }
}

/// The value produced by a provider or task.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Unit,
  Str(String),
  Path(PathBuf),
  Paths(Vec<PathBuf>),
  Env(Environment),
  Artifact(Artifact),
  List(Vec<Value>),
}

impl Value {
  /// Collect the file paths a downstream task reads from this value.
  ///
  /// An artifact contributes its outputs: those are exactly the files a
  /// dependent consumes as its own inputs.
  pub fn file_paths(&self) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    self.collect_file_paths(&mut paths);
    paths
  }

  fn collect_file_paths(&self, paths: &mut Vec<PathBuf>) {
    match self {
      Value::Path(p) => paths.push(p.clone()),
      Value::Paths(ps) => paths.extend(ps.iter().cloned()),
      Value::Artifact(a) => paths.extend(a.outputs.iter().cloned()),
      Value::List(vs) => {
        for v in vs {
          v.collect_file_paths(paths);
        }
      }
      Value::Unit | Value::Str(_) | Value::Env(_) => {}
    }
  }

  fn kind_name(&self) -> &'static str {
    match self {
      Value::Unit => "unit",
      Value::Str(_) => "string",
      Value::Path(_) => "path",
      Value::Paths(_) => "path list",
      Value::Env(_) => "environment",
      Value::Artifact(_) => "artifact",
      Value::List(_) => "list",
    }
  }
}

/// Errors raised by typed argument access inside run functions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
  /// The run function asked for a parameter it did not declare.
  #[error("no argument named '{0}'")]
  MissingArgument(String),

  /// The argument exists but holds a different value kind.
  #[error("argument '{name}' is a {found}, expected a {expected}")]
  WrongKind {
    name: String,
    expected: &'static str,
    found: &'static str,
  },
}

/// Resolved argument values for a run function, keyed by declared parameter
/// name.
pub struct Args<'run> {
  values: Vec<(&'run str, &'run Value)>,
}

impl<'run> Args<'run> {
  pub(crate) fn new(values: Vec<(&'run str, &'run Value)>) -> Self {
    Self { values }
  }

  /// Look up an argument by its declared parameter name.
  pub fn get(&self, name: &str) -> Result<&'run Value, ValueError> {
    self
      .values
      .iter()
      .find(|(n, _)| *n == name)
      .map(|(_, v)| *v)
      .ok_or_else(|| ValueError::MissingArgument(name.to_string()))
  }

  /// A single path argument.
  pub fn path(&self, name: &str) -> Result<&'run Path, ValueError> {
    match self.get(name)? {
      Value::Path(p) => Ok(p.as_path()),
      other => Err(self.wrong_kind(name, "path", other)),
    }
  }

  /// All file paths carried by an argument, whatever its shape.
  pub fn paths(&self, name: &str) -> Result<Vec<PathBuf>, ValueError> {
    Ok(self.get(name)?.file_paths())
  }

  /// An environment argument.
  pub fn env(&self, name: &str) -> Result<&'run Environment, ValueError> {
    match self.get(name)? {
      Value::Env(env) => Ok(env),
      other => Err(self.wrong_kind(name, "environment", other)),
    }
  }

  /// An artifact argument.
  pub fn artifact(&self, name: &str) -> Result<&'run Artifact, ValueError> {
    match self.get(name)? {
      Value::Artifact(a) => Ok(a),
      other => Err(self.wrong_kind(name, "artifact", other)),
    }
  }

  /// The union of file paths across all arguments, in declaration order.
  ///
  /// This is the input set the staleness checker compares a task's declared
  /// outputs against.
  pub fn file_paths(&self) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for (_, value) in &self.values {
      value.collect_file_paths(&mut paths);
    }
    paths.dedup();
    paths
  }

  fn wrong_kind(&self, name: &str, expected: &'static str, found: &Value) -> ValueError {
    ValueError::WrongKind {
      name: name.to_string(),
      expected,
      found: found.kind_name(),
    }
  }
}
