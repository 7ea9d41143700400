//! Rule constructors: the script-facing `generate*` family.
//!
//! All constructors canonicalize paths first and expand command strings
//! exactly once, against the outputs/inputs of the constructing call. When
//! a call extends an existing rule, new commands are still expanded against
//! the extending call's own first output/input.

use crate::consts::{ANON_DIR, DIR_MARK, DIR_RULE_PRIORITY, DOT_RULE_PRIORITY};
use crate::error::{Result, RuleError};
use crate::expand::expand_command;
use crate::path::{normalize_filename, parent_dir};
use crate::project::Project;
use crate::rules::{Rule, push_unique};
use crate::util::hash::md5_hex;

/// Does this output live in a subdirectory the generated artifact must
/// create? Absolute and tree-escaping paths are left alone.
fn needs_dir_mark(output: &str) -> bool {
  !output.starts_with('/') && output != ".." && !output.starts_with("../") && output.contains('/')
}

impl Project {
  /// Canonicalize outputs/inputs and expand commands for a constructor
  /// call. Outputs and inputs are de-duplicated keeping insertion order.
  fn prepare(
    &self,
    outputs: &[String],
    inputs: &[String],
    commands: &[String],
  ) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut canon_outputs = Vec::new();
    for output in outputs {
      push_unique(&mut canon_outputs, &normalize_filename(&[output]));
    }
    let mut canon_inputs = Vec::new();
    for input in inputs {
      push_unique(&mut canon_inputs, &normalize_filename(&[input]));
    }
    let expanded = commands
      .iter()
      .map(|cmd| expand_command(cmd, &self.vars, &canon_outputs, &canon_inputs))
      .collect();
    (canon_outputs, canon_inputs, expanded)
  }

  /// Distinct existing rules covering any of `outputs`.
  fn existing_rules(&self, outputs: &[String]) -> Vec<(String, crate::rules::RuleId)> {
    let mut found: Vec<(String, crate::rules::RuleId)> = Vec::new();
    for output in outputs {
      if let Some(id) = self.rules.lookup(output) {
        if !found.iter().any(|(_, seen)| *seen == id) {
          found.push((output.clone(), id));
        }
      }
    }
    found
  }

  /// Declare (or extend) a rule. See the module docs for the expansion
  /// discipline; merging two preexisting distinct rules is fatal, as is
  /// colliding with a directory rule. Returns the first output.
  pub fn generate(&mut self, outputs: &[String], inputs: &[String], commands: &[String]) -> Result<String> {
    let (outputs, inputs, commands) = self.prepare(outputs, inputs, commands);
    self.generate_prepared(outputs, inputs, commands)
  }

  fn generate_prepared(
    &mut self,
    outputs: Vec<String>,
    inputs: Vec<String>,
    commands: Vec<String>,
  ) -> Result<String> {
    if outputs.is_empty() {
      return Err(RuleError::NoOutputs.into());
    }

    let found = self.existing_rules(&outputs);
    match found.as_slice() {
      [] => {
        let priority = if outputs.iter().any(|o| o.starts_with('.')) {
          DOT_RULE_PRIORITY
        } else {
          0
        };
        self.rules.insert(Rule {
          outputs: outputs.clone(),
          inputs,
          commands,
          priority,
          ..Rule::default()
        });
      }
      [(name, id)] => {
        let id = *id;
        if self.rules.rule(id).is_directory {
          return Err(RuleError::DirectoryCollision(name.clone()).into());
        }
        let rule = self.rules.rule_mut(id);
        for output in &outputs {
          push_unique(&mut rule.outputs, output);
        }
        for input in &inputs {
          push_unique(&mut rule.inputs, input);
        }
        for command in &commands {
          push_unique(&mut rule.commands, command);
        }
        for output in &outputs {
          self.rules.bind(output, id);
        }
      }
      [(first, _), (second, _), ..] => {
        return Err(
          RuleError::CannotMerge {
            first: first.clone(),
            second: second.clone(),
          }
          .into(),
        );
      }
    }

    for output in &outputs {
      if needs_dir_mark(output) {
        if let Some(parent) = parent_dir(output) {
          let mark = self.generate_directory(&parent.to_string())?;
          let id = self.rules.require(output)?;
          push_unique(&mut self.rules.rule_mut(id).inputs, &mark);
        }
      }
    }

    Ok(outputs.into_iter().next().unwrap_or_default())
  }

  /// No-merge idempotent variant of [`Project::generate`].
  ///
  /// When an output is already taken, succeeds only if that single rule
  /// already contains every requested output, input, and command; the rule
  /// is never mutated. A `false` return tells the caller to retry with a
  /// different name (distinct object files for per-flag compiles).
  pub fn generate_unique(
    &mut self,
    outputs: &[String],
    inputs: &[String],
    commands: &[String],
  ) -> Result<bool> {
    let (outputs, inputs, commands) = self.prepare(outputs, inputs, commands);
    if outputs.is_empty() {
      return Err(RuleError::NoOutputs.into());
    }

    let found = self.existing_rules(&outputs);
    match found.as_slice() {
      [] => {
        self.generate_prepared(outputs, inputs, commands)?;
        Ok(true)
      }
      [(_, id)] => {
        let rule = self.rules.rule(*id);
        let covered = outputs.iter().all(|o| rule.outputs.contains(o))
          && inputs.iter().all(|i| rule.inputs.contains(i))
          && commands.iter().all(|c| rule.commands.contains(c));
        Ok(covered)
      }
      _ => Ok(false),
    }
  }

  /// Copy rule: `dst` from `src` via `@$(CP) src dst`, `CP` defaulting to
  /// `cp`.
  pub fn generate_copy(&mut self, dst: &str, src: &str) -> Result<String> {
    self.vars.add("CP", "cp");
    self.generate(
      &[dst.to_string()],
      &[src.to_string()],
      &["@$(CP) $< $@".to_string()],
    )
  }

  /// Anonymous rule: the output name is a stable hash of `ext`, the inputs,
  /// and the commands, so repeated construction with identical parameters
  /// shares one rule. Returns the output path under `$(TMP)/.anon/`.
  pub fn generate_anonymous(&mut self, ext: &str, inputs: &[String], commands: &[String]) -> Result<String> {
    let mut canon_inputs = Vec::new();
    for input in inputs {
      push_unique(&mut canon_inputs, &normalize_filename(&[input]));
    }
    let digest = format!("{}\n{}\n{}", ext, canon_inputs.join(" "), commands.join("\n"));
    let hash = md5_hex(&digest);
    let output = normalize_filename(&[&self.tmp_dir(), ANON_DIR, &format!("{}{}", hash, ext)]);

    if self.rules.lookup(&output).is_none() {
      let outputs = vec![output.clone()];
      let expanded = commands
        .iter()
        .map(|cmd| expand_command(cmd, &self.vars, &outputs, &canon_inputs))
        .collect();
      self.generate_prepared(outputs, canon_inputs, expanded)?;
    }
    Ok(output)
  }

  /// Idempotent directory rule: `<dir>/.mark` created by an ignore-errors
  /// `mkdir -p` plus `touch`. Directory rules are precious, sort last, and
  /// recursively require their parent's mark. Returns the mark path.
  pub fn generate_directory(&mut self, dir: &str) -> Result<String> {
    let dir = normalize_filename(&[dir]);
    let mark = normalize_filename(&[&dir, DIR_MARK]);

    if let Some(id) = self.rules.lookup(&mark) {
      if !self.rules.rule(id).is_directory {
        return Err(RuleError::FileCollision(mark).into());
      }
      return Ok(mark);
    }

    let mut rule = Rule {
      outputs: vec![mark.clone()],
      commands: vec![format!("-@mkdir -p {}", dir), format!("@touch {}", mark)],
      is_directory: true,
      is_precious: true,
      priority: DIR_RULE_PRIORITY,
      ..Rule::default()
    };
    if needs_dir_mark(&dir) {
      if let Some(parent) = parent_dir(&dir) {
        let parent_mark = self.generate_directory(&parent.to_string())?;
        push_unique(&mut rule.inputs, &parent_mark);
      }
    }
    self.rules.insert(rule);
    Ok(mark)
  }
}
