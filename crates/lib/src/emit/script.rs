//! Shell-script emitter.
//!
//! A linear rendering for environments without any build runner: the
//! requested targets are walked depth-first (iteratively, marking a rule
//! done on its second visit) so every rule's dependencies are emitted
//! before the rule itself. Ignore-error commands run bare; strict ones get
//! `|| exit 1`.

use std::collections::HashSet;

use crate::emit::{effective_inputs, split_command};
use crate::error::Result;
use crate::project::Project;
use crate::rules::RuleId;

/// Render the rules reachable from `targets` as a shell script.
pub fn emit(project: &mut Project, targets: &[String]) -> Result<String> {
  for target in targets {
    project.rules.require(target)?;
  }

  let mut out = String::from("#!/bin/sh\n\n");
  project.rules.reset_emitted();

  let mut pending: Vec<(String, bool)> = targets.iter().rev().map(|t| (t.clone(), false)).collect();
  let mut visiting: HashSet<RuleId> = HashSet::new();

  while let Some((name, expanded)) = pending.pop() {
    let Some(id) = project.rules.lookup(&name) else {
      continue;
    };
    if project.rules.rule(id).emitted {
      continue;
    }
    if expanded {
      project.rules.rule_mut(id).emitted = true;
      emit_rule(&mut out, project, id);
      continue;
    }
    if !visiting.insert(id) {
      // Already on the stack: a dependency cycle among phony rules.
      continue;
    }
    pending.push((name, true));
    let deps = effective_inputs(project, id);
    for dep in deps.iter().rev() {
      if project.rules.lookup(dep).is_some() {
        pending.push((dep.clone(), false));
      }
    }
  }

  Ok(out)
}

fn emit_rule(out: &mut String, project: &Project, id: RuleId) {
  let rule = project.rules.rule(id);
  if rule.comments.is_empty() && rule.info.is_none() && rule.commands.is_empty() {
    return;
  }
  for comment in &rule.comments {
    out.push_str("# ");
    out.push_str(comment);
    out.push('\n');
  }
  if let Some(info) = &rule.info {
    out.push_str("echo \"\t");
    out.push_str(info);
    out.push_str("...\"\n");
  }
  for cmd in &rule.commands {
    let flags = split_command(cmd);
    out.push_str(&flags.text);
    if !flags.ignore_errors {
      out.push_str(" || exit 1");
    }
    out.push('\n');
  }
  out.push('\n');
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{Error, RuleError};

  fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  fn project() -> Project {
    let mut p = Project::new();
    p.vars.set("TMP", "out");
    p
  }

  #[test]
  fn dependencies_come_before_their_dependents() {
    let mut p = project();
    p.generate(&strs(&["a.o"]), &strs(&["a.c"]), &strs(&["cc -c a.c -o a.o"]))
      .unwrap();
    p.generate(&strs(&["prog"]), &strs(&["a.o"]), &strs(&["cc -o prog a.o"]))
      .unwrap();
    let text = emit(&mut p, &strs(&["prog"])).unwrap();
    let compile = text.find("cc -c a.c").unwrap();
    let link = text.find("cc -o prog").unwrap();
    assert!(compile < link, "{text}");
  }

  #[test]
  fn starts_with_a_shebang() {
    let mut p = project();
    p.generate(&strs(&["a"]), &[], &strs(&["touch a"])).unwrap();
    let text = emit(&mut p, &strs(&["a"])).unwrap();
    assert!(text.starts_with("#!/bin/sh\n"), "{text}");
  }

  #[test]
  fn strict_commands_exit_on_failure_ignorable_ones_run_bare() {
    let mut p = project();
    p.generate_directory("out/sub").unwrap();
    p.generate(&strs(&["out/sub/a"]), &[], &strs(&["touch $@"])).unwrap();
    let text = emit(&mut p, &strs(&["out/sub/a"])).unwrap();
    assert!(text.contains("mkdir -p out/sub\n"), "{text}");
    assert!(!text.contains("mkdir -p out/sub || exit 1"), "{text}");
    assert!(text.contains("touch out/sub/.mark || exit 1\n"), "{text}");
    assert!(text.contains("touch out/sub/a || exit 1\n"), "{text}");
    // The directory is created before anything inside it.
    assert!(text.find("mkdir -p out/sub").unwrap() < text.find("touch out/sub/a").unwrap());
  }

  #[test]
  fn shared_dependencies_run_once() {
    let mut p = project();
    p.generate(&strs(&["common.o"]), &[], &strs(&["cc -c common.c"])).unwrap();
    p.generate(&strs(&["a"]), &strs(&["common.o"]), &strs(&["link a"])).unwrap();
    p.generate(&strs(&["b"]), &strs(&["common.o"]), &strs(&["link b"])).unwrap();
    let text = emit(&mut p, &strs(&["a", "b"])).unwrap();
    assert_eq!(text.matches("cc -c common.c").count(), 1, "{text}");
  }

  #[test]
  fn cycles_terminate() {
    let mut p = project();
    p.generate(&strs(&["x"]), &strs(&["y"]), &strs(&["echo x"])).unwrap();
    p.generate(&strs(&["y"]), &strs(&["x"]), &strs(&["echo y"])).unwrap();
    p.rule_set_phony("x").unwrap();
    p.rule_set_phony("y").unwrap();
    let text = emit(&mut p, &strs(&["x"])).unwrap();
    assert!(text.contains("echo x"), "{text}");
    assert!(text.contains("echo y"), "{text}");
  }

  #[test]
  fn info_is_echoed_and_silent_markers_are_stripped() {
    let mut p = project();
    p.generate(&strs(&["a"]), &[], &strs(&["@touch a"])).unwrap();
    p.rule_set_info("a", "GEN a").unwrap();
    let text = emit(&mut p, &strs(&["a"])).unwrap();
    assert!(text.contains("echo \"\tGEN a...\"\ntouch a || exit 1\n"), "{text}");
  }

  #[test]
  fn unknown_targets_are_fatal() {
    let mut p = project();
    let err = emit(&mut p, &strs(&["nope"])).unwrap_err();
    assert!(matches!(err, Error::Rule(RuleError::NoSuchRule(_))), "{err}");
  }
}
