//! Artifact emission.
//!
//! All three emitters walk the store in descending priority (ties broken
//! by lexical output name), emit every rule at most once, and write
//! `<artifact>.new` before atomically renaming it over the artifact. A
//! failed run leaves any previous artifact untouched.

pub mod makefile;
pub mod ninja;
pub mod script;

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::project::Project;
use crate::rules::RuleId;

/// A command string with its leading `@` (silent) and `-` (ignore-errors)
/// markers split off.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandFlags {
  pub text: String,
  pub silent: bool,
  pub ignore_errors: bool,
}

pub fn split_command(cmd: &str) -> CommandFlags {
  let mut silent = false;
  let mut ignore_errors = false;
  let mut rest = cmd;
  loop {
    if let Some(stripped) = rest.strip_prefix('@') {
      silent = true;
      rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('-') {
      ignore_errors = true;
      rest = stripped;
    } else {
      break;
    }
  }
  CommandFlags {
    text: rest.to_string(),
    silent,
    ignore_errors,
  }
}

/// Concatenate commands into one pipeline string: `;` after ignorable
/// commands, `&&` after strict ones, silent markers stripped. A trailing
/// `;` joiner is closed with `true`; a trailing `&&` joiner is removed.
pub fn join_commands(commands: &[String]) -> String {
  let mut joined = String::new();
  for cmd in commands {
    let flags = split_command(cmd);
    if flags.text.is_empty() {
      continue;
    }
    joined.push_str(&flags.text);
    joined.push_str(if flags.ignore_errors { "; " } else { " && " });
  }
  if let Some(stripped) = joined.strip_suffix(" && ") {
    stripped.to_string()
  } else if joined.ends_with("; ") {
    joined.push_str("true");
    joined
  } else {
    joined
  }
}

/// The dependency list a runner should see for a rule: link-alias
/// expansion for non-phony rules, raw inputs for phony ones, and linker
/// switches dropped either way (they are not dependencies).
pub fn effective_inputs(project: &Project, id: RuleId) -> Vec<String> {
  let rule = project.rules.rule(id);
  let items = if rule.is_phony {
    rule.inputs.clone()
  } else {
    project.rule_get_link_inputs(&rule.inputs)
  };
  items.into_iter().filter(|item| !item.starts_with('-')).collect()
}

/// Write `content` to `<path>.new`, then rename over `path`.
pub fn write_atomic(path: &str, content: &str) -> Result<()> {
  let target = Path::new(path);
  if let Some(parent) = target.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
  }
  let staged = format!("{}.new", path);
  fs::write(&staged, content).map_err(|e| Error::io(&staged, e))?;
  fs::rename(&staged, target).map_err(|e| Error::io(path, e))?;
  Ok(())
}
