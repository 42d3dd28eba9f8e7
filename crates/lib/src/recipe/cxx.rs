//! C++ compile and link recipes.
//!
//! Thin wrappers over the system toolchain. Each helper runs the compiler
//! once and returns an [`Artifact`] declaring the files it produced and the
//! files it consumed; the engine's staleness checker does the rest.

use std::path::{Path, PathBuf};

use crate::env::Environment;
use crate::value::Artifact;

use super::shell::{self, ShellError};

/// Seed a build environment from the process environment.
///
/// `CXX` defaults to `c++`; `CXXFLAGS` and `LDFLAGS` default to empty so
/// recipes can layer their own flags with [`Environment::append`].
pub fn default_env() -> Environment {
  let mut env = Environment::new();
  env.set("CXX", std::env::var("CXX").unwrap_or_else(|_| "c++".to_string()));
  env.set("CXXFLAGS", std::env::var("CXXFLAGS").unwrap_or_default());
  env.set("LDFLAGS", std::env::var("LDFLAGS").unwrap_or_default());
  env
}

/// Object file path for a source file: `foo.cc` -> `foo.o`.
pub fn object_path(src: &Path) -> PathBuf {
  src.with_extension("o")
}

/// Compile one source file to its object file.
///
/// The headers are recorded as inputs alongside the source itself: a changed
/// header invalidates every object compiled against it.
pub fn compile_object(src: &Path, headers: &[PathBuf], env: &Environment) -> Result<Artifact, ShellError> {
  let obj = object_path(src);
  let (program, args) = compile_args(src, &obj, env);
  shell::run(&program, &args, env, None)?;

  let mut inputs = vec![src.to_path_buf()];
  inputs.extend(headers.iter().cloned());
  Ok(Artifact::new(vec![obj], inputs))
}

/// Link object files into an executable.
pub fn link_executable(objects: &[PathBuf], target: &Path, env: &Environment) -> Result<Artifact, ShellError> {
  let (program, args) = link_args(objects, target, env);
  shell::run(&program, &args, env, None)?;
  Ok(Artifact::new(vec![target.to_path_buf()], objects.to_vec()))
}

fn compile_args(src: &Path, obj: &Path, env: &Environment) -> (String, Vec<String>) {
  let program = compiler(env);
  let mut args = split_flags(env.get("CXXFLAGS"));
  args.push("-c".to_string());
  args.push(src.display().to_string());
  args.push("-o".to_string());
  args.push(obj.display().to_string());
  (program, args)
}

fn link_args(objects: &[PathBuf], target: &Path, env: &Environment) -> (String, Vec<String>) {
  let program = compiler(env);
  let mut args: Vec<String> = objects.iter().map(|o| o.display().to_string()).collect();
  args.push("-o".to_string());
  args.push(target.display().to_string());
  // Libraries come after the objects that reference them.
  args.extend(split_flags(env.get("LDFLAGS")));
  (program, args)
}

fn compiler(env: &Environment) -> String {
  env.get("CXX").unwrap_or("c++").to_string()
}

fn split_flags(flags: Option<&str>) -> Vec<String> {
  flags
    .map(|f| f.split_whitespace().map(str::to_string).collect())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn env_with(vars: &[(&str, &str)]) -> Environment {
    let mut env = Environment::new();
    for (key, value) in vars {
      env.set(*key, *value);
    }
    env
  }

  #[test]
  fn object_path_swaps_extension() {
    assert_eq!(object_path(Path::new("src/hasher.cc")), PathBuf::from("src/hasher.o"));
  }

  #[test]
  fn compile_invocation_shape() {
    let env = env_with(&[("CXX", "clang++"), ("CXXFLAGS", "-O2 -Wall")]);
    let (program, args) = compile_args(Path::new("main.cc"), Path::new("main.o"), &env);

    assert_eq!(program, "clang++");
    assert_eq!(args, vec!["-O2", "-Wall", "-c", "main.cc", "-o", "main.o"]);
  }

  #[test]
  fn compile_without_flags() {
    let env = env_with(&[("CXX", "c++"), ("CXXFLAGS", "")]);
    let (_, args) = compile_args(Path::new("main.cc"), Path::new("main.o"), &env);
    assert_eq!(args, vec!["-c", "main.cc", "-o", "main.o"]);
  }

  #[test]
  fn link_invocation_puts_libraries_last() {
    let env = env_with(&[("CXX", "c++"), ("LDFLAGS", "-lcrypto")]);
    let objects = vec![PathBuf::from("a.o"), PathBuf::from("b.o")];
    let (program, args) = link_args(&objects, Path::new("hasher"), &env);

    assert_eq!(program, "c++");
    assert_eq!(args, vec!["a.o", "b.o", "-o", "hasher", "-lcrypto"]);
  }

  #[test]
  fn compiler_falls_back_to_cxx() {
    let (program, _) = compile_args(Path::new("x.cc"), Path::new("x.o"), &Environment::new());
    assert_eq!(program, "c++");
  }
}
