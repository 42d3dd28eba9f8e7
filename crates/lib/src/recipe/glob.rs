//! Filesystem globbing for recipe providers.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Collect the files directly under `dir` with the given extension.
///
/// Sorted by file name so providers produce the same path list on every run.
pub fn files_with_extension(dir: &Path, ext: &str) -> io::Result<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
    let entry = entry.map_err(io::Error::other)?;
    if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == ext) {
      files.push(entry.path().to_path_buf());
    }
  }
  Ok(files)
}
