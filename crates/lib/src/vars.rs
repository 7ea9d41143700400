//! The layered variable store.
//!
//! Values live in a flat name→string map. `add` is set-if-absent (used for
//! defaults), `set` is last-wins, and `set_user` additionally remembers the
//! pair so the self-rebuild command can re-embed the user's configuration.
//! Directory-like names (`IN`, `OUT`, `TMP` plus anything registered with
//! [`VarStore::add_directory`]) are rebased when a subdirectory scope is
//! entered and restored when it is left.

use std::collections::{BTreeMap, BTreeSet};

use crate::path::normalize_filename;

#[derive(Debug, Default)]
pub struct VarStore {
  values: BTreeMap<String, String>,
  user_set: BTreeMap<String, String>,
  dir_names: BTreeSet<String>,
}

/// Saved values restored when a `load_directory` scope ends.
#[derive(Debug)]
pub struct DirScope {
  saved: Vec<(String, String)>,
}

impl VarStore {
  pub fn new() -> Self {
    let mut store = VarStore::default();
    for name in ["IN", "OUT", "TMP"] {
      store.dir_names.insert(name.to_string());
    }
    store
  }

  /// Set `name` only if it is absent; returns the value in effect.
  pub fn add(&mut self, name: &str, default: &str) -> String {
    self
      .values
      .entry(name.to_string())
      .or_insert_with(|| default.to_string())
      .clone()
  }

  /// Unconditional set.
  pub fn set(&mut self, name: &str, value: &str) {
    self.values.insert(name.to_string(), value.to_string());
  }

  /// Like [`VarStore::set`], plus the pair is remembered as a user override
  /// for re-embedding into the self-rebuild command.
  pub fn set_user(&mut self, name: &str, value: &str) {
    self.user_set.insert(name.to_string(), value.to_string());
    self.set(name, value);
  }

  /// Last-defined value across the global scope and any extra per-call
  /// scopes; later scopes win. Empty string when absent everywhere.
  pub fn get_in(&self, name: &str, scopes: &[&BTreeMap<String, String>]) -> String {
    let mut value = self.values.get(name).cloned();
    for scope in scopes {
      if let Some(v) = scope.get(name) {
        value = Some(v.clone());
      }
    }
    value.unwrap_or_default()
  }

  pub fn get(&self, name: &str) -> String {
    self.get_in(name, &[])
  }

  /// Concatenate all defined values across scopes with single spaces.
  pub fn get_merge(&self, name: &str, scopes: &[&BTreeMap<String, String>]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(v) = self.values.get(name) {
      parts.push(v);
    }
    for scope in scopes {
      if let Some(v) = scope.get(name) {
        parts.push(v);
      }
    }
    parts.join(" ")
  }

  /// Space-append `values` to an existing variable, or initialize it.
  pub fn append(&mut self, name: &str, values: &[String]) {
    let addition = values.join(" ");
    match self.values.get_mut(name) {
      Some(existing) if !existing.is_empty() => {
        existing.push(' ');
        existing.push_str(&addition);
      }
      _ => {
        self.values.insert(name.to_string(), addition);
      }
    }
  }

  /// Register `name` as directory-like so it participates in scope rebasing.
  pub fn add_directory(&mut self, name: &str) {
    self.dir_names.insert(name.to_string());
  }

  pub fn is_directory_name(&self, name: &str) -> bool {
    self.dir_names.contains(name)
  }

  pub fn is_user_set(&self, name: &str) -> bool {
    self.user_set.contains_key(name)
  }

  /// The remembered user overrides, sorted by name.
  pub fn user_overrides(&self) -> &BTreeMap<String, String> {
    &self.user_set
  }

  /// All variables, sorted by name.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Rebase every directory-like variable into `subdir`, returning the
  /// previous values for [`VarStore::leave_directory`].
  pub fn enter_directory(&mut self, subdir: &str) -> DirScope {
    let mut saved = Vec::new();
    for name in self.dir_names.clone() {
      if let Some(old) = self.values.get(&name).cloned() {
        saved.push((name.clone(), old.clone()));
        let rebased = normalize_filename(&[&old, subdir]);
        self.values.insert(name, rebased);
      }
    }
    DirScope { saved }
  }

  pub fn leave_directory(&mut self, scope: DirScope) {
    for (name, value) in scope.saved {
      self.values.insert(name, value);
    }
  }
}

/// Recognize one command-line word as a variable assignment.
///
/// `KEY=VALUE` maps to itself; `--with-foo`/`--enable-foo` map to
/// `WITH_FOO=1` and `--without-foo`/`--disable-foo` to `WITH_FOO=0`
/// (hyphens to underscores, uppercased). Returns `None` for words that are
/// not assignments; the caller decides whether those are subcommands,
/// targets, or fatal unknown flags.
pub fn recognize_assignment(word: &str) -> Option<(String, String)> {
  // `--without-` must be tried before its `--with-` prefix.
  for (prefix, value) in [
    ("--without-", "0"),
    ("--disable-", "0"),
    ("--with-", "1"),
    ("--enable-", "1"),
  ] {
    if let Some(name) = word.strip_prefix(prefix) {
      if name.is_empty() {
        return None;
      }
      let name = name.replace('-', "_").to_uppercase();
      return Some((format!("WITH_{}", name), value.to_string()));
    }
  }
  if !word.starts_with('-') {
    if let Some(eq) = word.find('=') {
      if eq > 0 {
        return Some((word[..eq].to_string(), word[eq + 1..].to_string()));
      }
    }
  }
  None
}
