//! girder-lib: a dependency-injected build graph engine.
//!
//! Build steps are declared as plain functions whose parameter names are the
//! names of their dependencies. The engine provides:
//! - `Registry`: named provider and task declarations
//! - `DependencyGraph`: on-demand resolution into a topological order
//! - `execute`: memoized, dependency-ordered execution with up-to-date
//!   skipping for file-backed tasks
//! - `recipe`: the compile/link collaborators the repository's own build
//!   recipe is made of

pub mod env;
pub mod execute;
pub mod recipe;
pub mod registry;
pub mod resolve;
pub mod stale;
pub mod value;

pub use env::Environment;
pub use execute::{ExecuteConfig, ExecuteError, RunOutcome, RunSummary, run_target};
pub use registry::{Kind, Registry, RegistryError, TaskError};
pub use resolve::{DependencyGraph, ResolveError};
pub use value::{Args, Artifact, Value, ValueError};
