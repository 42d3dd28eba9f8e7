//! The repository's build recipe.
//!
//! Registers the providers and tasks that compile every C++ source in the
//! working directory and link the result into the `hasher` executable:
//!
//! ```text
//! project_root -> sources, headers
//! build_env -> link_env
//! sources, headers, build_env -> objects -> executable (default)
//! ```

use std::path::{Path, PathBuf};

use girder_lib::recipe::{cxx, glob};
use girder_lib::registry::{Registry, RegistryError};
use girder_lib::value::{Args, Value};

/// Name of the executable the default task links.
const TARGET_NAME: &str = "hasher";

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
  registry.provide("project_root", &[], |_: &Args| {
    Ok(Value::Path(std::env::current_dir()?))
  })?;

  registry.provide("sources", &["project_root"], |args: &Args| {
    let root = args.path("project_root")?;
    Ok(Value::Paths(glob::files_with_extension(root, "cc")?))
  })?;

  registry.provide("headers", &["project_root"], |args: &Args| {
    let root = args.path("project_root")?;
    Ok(Value::Paths(glob::files_with_extension(root, "h")?))
  })?;

  registry.provide("build_env", &[], |_: &Args| Ok(Value::Env(cxx::default_env())))?;

  // The link step needs libcrypto on top of the build environment.
  registry.provide("link_env", &["build_env"], |args: &Args| {
    let env = args.env("build_env")?.clone();
    Ok(Value::Env(env.append("LDFLAGS", "-lcrypto")))
  })?;

  registry.file_task(
    "objects",
    &["sources", "headers", "build_env"],
    |args: &Args| {
      let sources = args.paths("sources").unwrap_or_default();
      sources.iter().map(|src| cxx::object_path(src)).collect()
    },
    |args: &Args| {
      let sources = args.paths("sources")?;
      let headers = args.paths("headers")?;
      let env = args.env("build_env")?;

      let mut artifacts = Vec::with_capacity(sources.len());
      for src in &sources {
        artifacts.push(Value::Artifact(cxx::compile_object(src, &headers, env)?));
      }
      Ok(Value::List(artifacts))
    },
  )?;

  registry.file_task(
    "executable",
    &["objects", "link_env"],
    |_: &Args| vec![PathBuf::from(TARGET_NAME)],
    |args: &Args| {
      let objects = args.paths("objects")?;
      let env = args.env("link_env")?;
      Ok(Value::Artifact(cxx::link_executable(
        &objects,
        Path::new(TARGET_NAME),
        env,
      )?))
    },
  )?;

  registry.set_default("executable")
}
