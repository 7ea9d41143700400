//! The aggregate state a rules script operates on.
//!
//! A `Project` owns the variable store, the rule store, and the registry of
//! input files whose change must regenerate the build artifact. The Lua
//! layer holds it as `Rc<RefCell<Project>>` and mutates it through the
//! functions on the `mk` global.

use crate::consts::TEMP_DIR;
use crate::path::normalize_filename;
use crate::rules::{RuleStore, push_unique};
use crate::vars::VarStore;

#[derive(Debug, Default)]
pub struct Project {
  pub vars: VarStore,
  pub rules: RuleStore,
  input_files: Vec<String>,
  loaded_modules: Vec<String>,
  temp_counter: usize,
}

impl Project {
  pub fn new() -> Self {
    Project {
      vars: VarStore::new(),
      rules: RuleStore::new(),
      input_files: Vec::new(),
      loaded_modules: Vec::new(),
      temp_counter: 0,
    }
  }

  /// Remember a script, module, or variables file so the self-rebuild rule
  /// depends on it. Ordered, de-duplicated.
  pub fn register_input(&mut self, path: &str) {
    push_unique(&mut self.input_files, path);
  }

  pub fn input_files(&self) -> &[String] {
    &self.input_files
  }

  /// Record that a module file has been loaded; returns false when it
  /// already was (the caller skips the reload).
  pub fn mark_module_loaded(&mut self, path: &str) -> bool {
    if self.loaded_modules.iter().any(|m| m == path) {
      return false;
    }
    self.loaded_modules.push(path.to_string());
    true
  }

  /// A fresh process-unique filename under `$(TMP)`.
  pub fn make_temp_filename(&mut self, ext: &str) -> String {
    let tmp = self.tmp_dir();
    self.temp_counter += 1;
    normalize_filename(&[&tmp, TEMP_DIR, &format!("t{}{}", self.temp_counter, ext)])
  }

  /// The value of `TMP`, falling back to the current directory.
  pub fn tmp_dir(&self) -> String {
    let tmp = self.vars.get("TMP");
    if tmp.is_empty() { ".".to_string() } else { tmp }
  }
}

/// Split a whitespace-separated word list; used wherever the script surface
/// accepts either a list or a single space-joined string.
pub fn to_list(text: &str) -> Vec<String> {
  text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn input_registry_deduplicates_in_order() {
    let mut project = Project::new();
    project.register_input("Rules.lua");
    project.register_input("common.lua");
    project.register_input("Rules.lua");
    assert_eq!(project.input_files(), ["Rules.lua", "common.lua"]);
  }

  #[test]
  fn modules_load_once() {
    let mut project = Project::new();
    assert!(project.mark_module_loaded("m.lua"));
    assert!(!project.mark_module_loaded("m.lua"));
  }

  #[test]
  fn temp_filenames_are_unique_and_live_under_tmp() {
    let mut project = Project::new();
    project.vars.set("TMP", "out");
    let a = project.make_temp_filename(".c");
    let b = project.make_temp_filename(".c");
    assert_ne!(a, b);
    assert!(a.starts_with("out/.tmp/"));
    assert!(a.ends_with(".c"));
  }

  #[test]
  fn splits_word_lists() {
    assert_eq!(to_list("a  b\tc"), ["a", "b", "c"]);
    assert!(to_list("").is_empty());
  }
}
