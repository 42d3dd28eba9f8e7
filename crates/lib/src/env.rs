//! Process environment construction for build steps.
//!
//! An `Environment` is an ordered set of variables with merge semantics
//! suited to compiler and linker flags: `append` and `prepend` join values
//! with a space instead of replacing them, so a link step can layer
//! `LDFLAGS="-lcrypto"` on top of an inherited build environment.

use std::collections::BTreeMap;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// An ordered variable map applied onto spawned commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
  vars: BTreeMap<String, String>,
}

impl Environment {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set a variable, replacing any existing value.
  pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.vars.insert(key.into(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(String::as_str)
  }

  /// Append to a variable, space-separated when it already has a value.
  pub fn append(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    let key = key.into();
    let value = value.into();
    match self.vars.get_mut(&key) {
      Some(existing) if !existing.is_empty() => {
        existing.push(' ');
        existing.push_str(&value);
      }
      _ => {
        self.vars.insert(key, value);
      }
    }
    self
  }

  /// Prepend to a variable, space-separated when it already has a value.
  pub fn prepend(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    let key = key.into();
    let mut value = value.into();
    match self.vars.get_mut(&key) {
      Some(existing) if !existing.is_empty() => {
        value.push(' ');
        value.push_str(existing);
        *existing = value;
      }
      _ => {
        self.vars.insert(key, value);
      }
    }
    self
  }

  /// Merge another environment over this one; `other`'s values win.
  pub fn merged(mut self, other: &Environment) -> Self {
    for (key, value) in &other.vars {
      self.vars.insert(key.clone(), value.clone());
    }
    self
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vars.is_empty()
  }

  /// Apply the variables onto a command, leaving the inherited environment
  /// otherwise untouched.
  pub fn apply_to(&self, cmd: &mut Command) {
    for (key, value) in &self.vars {
      cmd.env(key, value);
    }
  }
}

impl FromIterator<(String, String)> for Environment {
  fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
    Self {
      vars: iter.into_iter().collect(),
    }
  }
}
