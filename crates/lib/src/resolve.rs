//! Dependency resolution.
//!
//! Resolves a requested entry into a deterministic topological execution
//! order. The graph is never declared explicitly: it is derived on demand by
//! following each entry's parameter names depth-first, in declaration order,
//! so the same recipe always yields the same order. Cycles and unresolvable
//! names are reported before anything executes.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::registry::{Registry, RegistryEntry};

/// Errors raised while resolving a target into an execution order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
  /// The requested target is not registered.
  #[error("unknown build target '{0}'")]
  UnknownTarget(String),

  /// An entry declares a parameter that matches no registered name.
  #[error("'{wanted_by}' depends on unknown entry '{name}'")]
  UnknownDependency { wanted_by: String, name: String },

  /// A dependency cycle, reported as the path that closes it.
  #[error("dependency cycle: {}", .path.join(" -> "))]
  CyclicDependency { path: Vec<String> },
}

/// The resolved dependency graph for one requested target.
///
/// Holds the topological execution order (dependencies before dependents)
/// plus a petgraph view of the "requires" edges for dependency queries. The
/// graph borrows the registry's entries and never owns them; it is built
/// fresh per resolution request.
#[derive(Debug)]
pub struct DependencyGraph<'r> {
  graph: DiGraph<&'r str, ()>,
  nodes: HashMap<&'r str, NodeIndex>,
  order: Vec<&'r RegistryEntry>,
}

impl<'r> DependencyGraph<'r> {
  /// Resolve `target` against the registry.
  ///
  /// Depth-first traversal following parameter names in declaration order;
  /// a visiting-set detects cycles and reports the full cycle path, and any
  /// name absent from the registry fails identifying the requesting entry.
  pub fn resolve(registry: &'r Registry, target: &str) -> Result<Self, ResolveError> {
    let root = registry
      .get(target)
      .ok_or_else(|| ResolveError::UnknownTarget(target.to_string()))?;

    let mut walk = Walk {
      registry,
      graph: DiGraph::new(),
      nodes: HashMap::new(),
      order: Vec::new(),
      state: HashMap::new(),
      visiting: Vec::new(),
    };
    walk.visit(root)?;

    Ok(Self {
      graph: walk.graph,
      nodes: walk.nodes,
      order: walk.order,
    })
  }

  /// The execution order: every dependency precedes its dependents, and the
  /// target is last.
  pub fn order(&self) -> &[&'r RegistryEntry] {
    &self.order
  }

  /// The requested target's entry.
  pub fn target(&self) -> &'r RegistryEntry {
    self.order.last().expect("resolution always includes the target")
  }

  pub fn contains(&self, name: &str) -> bool {
    self.nodes.contains_key(name)
  }

  /// Number of entries the target transitively requires, itself included.
  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// Direct dependencies of an entry in this graph.
  pub fn dependencies(&self, name: &str) -> Vec<&'r str> {
    self.neighbors(name, Direction::Incoming)
  }

  /// Entries in this graph that directly require `name`.
  pub fn dependents(&self, name: &str) -> Vec<&'r str> {
    self.neighbors(name, Direction::Outgoing)
  }

  fn neighbors(&self, name: &str, direction: Direction) -> Vec<&'r str> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };
    self
      .graph
      .neighbors_directed(idx, direction)
      .map(|n| self.graph[n])
      .collect()
  }
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
  Visiting,
  Visited,
}

struct Walk<'r> {
  registry: &'r Registry,
  graph: DiGraph<&'r str, ()>,
  nodes: HashMap<&'r str, NodeIndex>,
  order: Vec<&'r RegistryEntry>,
  state: HashMap<&'r str, VisitState>,
  /// Current DFS path, for cycle reporting.
  visiting: Vec<&'r str>,
}

impl<'r> Walk<'r> {
  fn visit(&mut self, entry: &'r RegistryEntry) -> Result<NodeIndex, ResolveError> {
    let name = entry.name();
    match self.state.get(name) {
      Some(VisitState::Visited) => return Ok(self.nodes[name]),
      Some(VisitState::Visiting) => return Err(self.cycle(name)),
      None => {}
    }

    self.state.insert(name, VisitState::Visiting);
    self.visiting.push(name);

    let mut dep_indices = Vec::with_capacity(entry.params().len());
    for param in entry.params() {
      let dep = self
        .registry
        .get(param)
        .ok_or_else(|| ResolveError::UnknownDependency {
          wanted_by: name.to_string(),
          name: param.clone(),
        })?;
      dep_indices.push(self.visit(dep)?);
    }

    self.visiting.pop();
    self.state.insert(name, VisitState::Visited);

    let idx = self.graph.add_node(name);
    self.nodes.insert(name, idx);
    for dep_idx in dep_indices {
      // Edge from dependency to dependent, as in any build DAG.
      self.graph.add_edge(dep_idx, idx, ());
    }
    self.order.push(entry);
    Ok(idx)
  }

  fn cycle(&self, name: &str) -> ResolveError {
    let start = self.visiting.iter().position(|n| *n == name).unwrap_or(0);
    let mut path: Vec<String> = self.visiting[start..].iter().map(|n| n.to_string()).collect();
    path.push(name.to_string());
    ResolveError::CyclicDependency { path }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry::TaskError;
  use crate::value::{Args, Value};

  fn unit(_: &Args) -> Result<Value, TaskError> {
    Ok(Value::Unit)
  }

  fn names<'r>(graph: &DependencyGraph<'r>) -> Vec<&'r str> {
    graph.order().iter().map(|e| e.name()).collect()
  }

  #[test]
  fn linear_chain() {
    let mut registry = Registry::new();
    registry.provide("sources", &[], unit).unwrap();
    registry.task("objects", &["sources"], unit).unwrap();
    registry.task("executable", &["objects"], unit).unwrap();

    let graph = DependencyGraph::resolve(&registry, "executable").unwrap();
    assert_eq!(names(&graph), vec!["sources", "objects", "executable"]);
    assert_eq!(graph.target().name(), "executable");
  }

  #[test]
  fn diamond_visits_shared_dependency_once() {
    //     base
    //    /    \
    //  left  right
    //    \    /
    //     top
    let mut registry = Registry::new();
    registry.provide("base", &[], unit).unwrap();
    registry.task("left", &["base"], unit).unwrap();
    registry.task("right", &["base"], unit).unwrap();
    registry.task("top", &["left", "right"], unit).unwrap();

    let graph = DependencyGraph::resolve(&registry, "top").unwrap();
    assert_eq!(names(&graph), vec!["base", "left", "right", "top"]);
    assert_eq!(graph.len(), 4);
  }

  #[test]
  fn tie_break_follows_declaration_order_of_params() {
    let mut registry = Registry::new();
    registry.provide("a", &[], unit).unwrap();
    registry.provide("b", &[], unit).unwrap();
    registry.task("both", &["b", "a"], unit).unwrap();

    let graph = DependencyGraph::resolve(&registry, "both").unwrap();
    // "b" is declared first in the parameter list, so it resolves first.
    assert_eq!(names(&graph), vec!["b", "a", "both"]);
  }

  #[test]
  fn repeated_resolution_is_deterministic() {
    let mut registry = Registry::new();
    registry.provide("a", &[], unit).unwrap();
    registry.provide("b", &[], unit).unwrap();
    registry.provide("c", &[], unit).unwrap();
    registry.task("all", &["c", "a", "b"], unit).unwrap();

    let first = names(&DependencyGraph::resolve(&registry, "all").unwrap());
    for _ in 0..10 {
      assert_eq!(names(&DependencyGraph::resolve(&registry, "all").unwrap()), first);
    }
  }

  #[test]
  fn unknown_target() {
    let registry = Registry::new();
    let err = DependencyGraph::resolve(&registry, "nonexistent").unwrap_err();
    assert_eq!(err, ResolveError::UnknownTarget("nonexistent".to_string()));
  }

  #[test]
  fn unknown_dependency_names_the_requesting_entry() {
    let mut registry = Registry::new();
    registry.task("objects", &["sorces"], unit).unwrap();

    let err = DependencyGraph::resolve(&registry, "objects").unwrap_err();
    assert_eq!(
      err,
      ResolveError::UnknownDependency {
        wanted_by: "objects".to_string(),
        name: "sorces".to_string(),
      }
    );
  }

  #[test]
  fn two_node_cycle_is_reported_not_overflowed() {
    let mut registry = Registry::new();
    registry.task("a", &["b"], unit).unwrap();
    registry.task("b", &["a"], unit).unwrap();

    let err = DependencyGraph::resolve(&registry, "a").unwrap_err();
    assert_eq!(
      err,
      ResolveError::CyclicDependency {
        path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
      }
    );
  }

  #[test]
  fn self_cycle() {
    let mut registry = Registry::new();
    registry.task("narcissus", &["narcissus"], unit).unwrap();

    let err = DependencyGraph::resolve(&registry, "narcissus").unwrap_err();
    assert_eq!(
      err,
      ResolveError::CyclicDependency {
        path: vec!["narcissus".to_string(), "narcissus".to_string()],
      }
    );
  }

  #[test]
  fn cycle_reported_from_its_entry_point() {
    // start -> a -> b -> a: the reported path covers only the cycle itself.
    let mut registry = Registry::new();
    registry.task("a", &["b"], unit).unwrap();
    registry.task("b", &["a"], unit).unwrap();
    registry.task("start", &["a"], unit).unwrap();

    let err = DependencyGraph::resolve(&registry, "start").unwrap_err();
    assert_eq!(
      err,
      ResolveError::CyclicDependency {
        path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
      }
    );
  }

  #[test]
  fn dependency_queries() {
    let mut registry = Registry::new();
    registry.provide("base", &[], unit).unwrap();
    registry.task("left", &["base"], unit).unwrap();
    registry.task("right", &["base"], unit).unwrap();
    registry.task("top", &["left", "right"], unit).unwrap();

    let graph = DependencyGraph::resolve(&registry, "top").unwrap();

    let mut deps = graph.dependencies("top");
    deps.sort_unstable();
    assert_eq!(deps, vec!["left", "right"]);

    let mut users = graph.dependents("base");
    users.sort_unstable();
    assert_eq!(users, vec!["left", "right"]);

    assert!(graph.dependencies("base").is_empty());
    assert!(graph.dependents("top").is_empty());
    assert!(graph.dependencies("unrelated").is_empty());
  }

  #[test]
  fn resolution_is_scoped_to_the_target() {
    let mut registry = Registry::new();
    registry.provide("used", &[], unit).unwrap();
    registry.provide("unused", &[], unit).unwrap();
    registry.task("build", &["used"], unit).unwrap();

    let graph = DependencyGraph::resolve(&registry, "build").unwrap();
    assert!(graph.contains("used"));
    assert!(!graph.contains("unused"));
    assert_eq!(graph.len(), 2);
  }

  #[test]
  fn resolved_graph_is_acyclic() {
    let mut registry = Registry::new();
    registry.provide("a", &[], unit).unwrap();
    registry.task("b", &["a"], unit).unwrap();
    registry.task("c", &["a", "b"], unit).unwrap();

    let graph = DependencyGraph::resolve(&registry, "c").unwrap();
    assert!(!petgraph::algo::is_cyclic_directed(&graph.graph));
  }
}
