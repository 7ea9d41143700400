//! Housekeeping rules injected before emission.
//!
//! Order matters: hash markers come first so the bootstrap rules themselves
//! stay out of hash tracking, then the self-rebuild rule, the clean rule,
//! and the phony collector. The verifier runs last and only warns.

use std::collections::BTreeSet;

use tracing::warn;

use crate::consts::{CLEAN_ECHO_EVERY, CLEAN_LINE_MAX};
use crate::error::Result;
use crate::hashmark::add_hash_markers;
use crate::project::Project;
use crate::rules::{Rule, push_unique};
use crate::util::shell_quote;

/// How the driver was invoked; re-embedded into the self-rebuild command.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
  /// Canonical path of the artifact being generated.
  pub artifact: String,
  /// Path of the driver executable.
  pub driver: String,
  /// Subcommand to re-invoke (`makefile`, `ninjafile`, `scriptfile`).
  pub subcommand: String,
  /// Explicit targets, for `scriptfile` re-invocation.
  pub targets: Vec<String>,
}

/// Inject all housekeeping rules.
pub fn inject(project: &mut Project, cfg: &BootstrapConfig) -> Result<()> {
  add_hash_markers(project)?;
  add_self_rebuild(project, cfg)?;
  add_clean_rule(project)?;
  add_phony_collector(project)?;
  Ok(())
}

/// The artifact regenerates itself whenever a loaded script, module, or
/// variables file changes, re-invoking the driver with the preserved user
/// configuration. Every input gets a bare no-command rule so a deleted
/// file does not halt the runner.
fn add_self_rebuild(project: &mut Project, cfg: &BootstrapConfig) -> Result<()> {
  let mut inputs: Vec<String> = project.input_files().to_vec();
  push_unique(&mut inputs, &cfg.driver);

  for input in &inputs {
    if project.rules.lookup(input).is_none() {
      // Precious: these stand in for source files, which clean must
      // never touch.
      project.rules.insert(Rule {
        outputs: vec![input.clone()],
        is_precious: true,
        ..Rule::default()
      });
    }
  }

  let mut words: Vec<String> = vec![cfg.driver.clone()];
  for flag in ["IN", "OUT", "INFILE", "OUTFILE"] {
    words.push(format!("--{}={}", flag.to_lowercase(), project.vars.get(flag)));
  }
  for (name, value) in project.vars.user_overrides() {
    words.push(format!("{}={}", name, value));
  }
  words.push(cfg.subcommand.clone());
  words.extend(cfg.targets.iter().cloned());

  // Escaped so the one-shot expansion in generate() puts the literal
  // text back.
  let command: String = words
    .iter()
    .map(|w| shell_quote(w))
    .collect::<Vec<_>>()
    .join(" ")
    .replace('$', "$$");

  let artifact = project.generate(&[cfg.artifact.clone()], &inputs, &[command])?;
  project.rule_set_precious(&artifact)?;
  project.rule_set_info(&artifact, &format!("REGEN {}", artifact))?;
  Ok(())
}

/// Phony `clean` target removing every output of every rule that is
/// neither precious nor phony, batched so no line grows unwieldy.
fn add_clean_rule(project: &mut Project) -> Result<()> {
  let mut files: Vec<String> = Vec::new();
  for id in project.rules.ids() {
    let rule = project.rules.rule(id);
    if rule.is_precious || rule.is_phony {
      continue;
    }
    for output in &rule.outputs {
      push_unique(&mut files, output);
    }
  }

  let mut commands: Vec<String> = Vec::new();
  let mut line = String::from("rm -f");
  let mut batches = 0usize;
  for file in &files {
    if line.len() + 1 + file.len() > CLEAN_LINE_MAX && line != "rm -f" {
      commands.push(format!("-@{}", line));
      batches += 1;
      if batches % CLEAN_ECHO_EVERY == 0 {
        commands.push("@echo \"\tcleaning...\"".to_string());
      }
      line = String::from("rm -f");
    }
    line.push(' ');
    line.push_str(file);
  }
  if line != "rm -f" {
    commands.push(format!("-@{}", line));
  }

  let clean = project.generate(&["clean".to_string()], &[], &commands)?;
  project.rule_set_phony(&clean)?;
  project.rule_set_info(&clean, "CLEAN")?;
  Ok(())
}

/// `.PHONY` rule listing every phony target as an input.
fn add_phony_collector(project: &mut Project) -> Result<()> {
  let mut targets: Vec<String> = Vec::new();
  for id in project.rules.ids() {
    let rule = project.rules.rule(id);
    if rule.is_phony {
      for output in &rule.outputs {
        push_unique(&mut targets, output);
      }
    }
  }
  let phony = project.generate(&[".PHONY".to_string()], &targets, &[])?;
  project.rule_set_phony(&phony)?;
  project.rule_set_precious(&phony)?;
  Ok(())
}

/// Warn for every rule input that is neither generated by the graph nor
/// present on the filesystem. Linker switches are exempt. Returns the
/// number of distinct missing inputs.
pub fn verify_inputs(project: &Project) -> usize {
  let mut missing: BTreeSet<&str> = BTreeSet::new();
  for id in project.rules.ids() {
    for input in &project.rules.rule(id).inputs {
      if input.starts_with('-') || project.rules.lookup(input).is_some() {
        continue;
      }
      if std::path::Path::new(input).exists() {
        continue;
      }
      missing.insert(input.as_str());
    }
  }
  for input in &missing {
    warn!(input = %input, "input is neither generated nor present");
  }
  missing.len()
}
